use rdf_lens_model::{QueryKind, Variable, VariableNameParseError};
use serde::Deserialize;

/// The role of a result variable in the visual graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableRole {
    /// The variable binds the source node of edges.
    Subject,
    /// The variable binds the target node of edges.
    Object,
    /// The variable binds the label of edges between subjects and objects.
    Predicate,
    /// The variable is only shown in the result table.
    Ignore,
    /// The variable binds an attribute of the node bound by the given variable.
    AttributeOf(Variable),
}

impl VariableRole {
    pub fn is_node(&self) -> bool {
        matches!(self, VariableRole::Subject | VariableRole::Object)
    }
}

/// An error raised when [ProjectionRules] are inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionRuleError {
    #[error("Invalid variable name: {0}")]
    InvalidVariable(#[from] VariableNameParseError),
    #[error("The variable ?{0} has been assigned more than one role")]
    DuplicateVariable(String),
    #[error("The attribute ?{attribute} refers to ?{target}, which is not a subject or an object")]
    AttributeTargetNotANode { attribute: String, target: String },
}

/// Declarative rules that assign a [VariableRole] to result variables.
///
/// Variables without an assigned role are ignored. The order of assignments determines the order
/// in which elements are produced for a row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<RoleAssignment>")]
pub struct ProjectionRules {
    assignments: Vec<(Variable, VariableRole)>,
}

impl ProjectionRules {
    /// Creates a [ProjectionRulesBuilder].
    pub fn builder() -> ProjectionRulesBuilder {
        ProjectionRulesBuilder::default()
    }

    /// The classic `?subject ?predicate ?object` layout of `CONSTRUCT` results.
    pub fn triples() -> Self {
        Self {
            assignments: vec![
                (Variable::new_unchecked("subject"), VariableRole::Subject),
                (Variable::new_unchecked("predicate"), VariableRole::Predicate),
                (Variable::new_unchecked("object"), VariableRole::Object),
            ],
        }
    }

    /// Infers rules for a query of the given `kind` producing `variables`.
    ///
    /// - `CONSTRUCT` results use [Self::triples].
    /// - `SELECT` results assign roles by variable name (`?s`/`?subject`, `?p`/`?predicate`/
    ///   `?property`, `?o`/`?object`) and ignore everything else.
    /// - SHACL validation reports link each `?focusNode` to its `?value` through `?resultPath`,
    ///   and attach severity, message and shape to the focus node.
    /// - `ASK` results have nothing to visualize.
    pub fn for_query(kind: QueryKind, variables: &[Variable]) -> Self {
        let has = |name: &str| variables.iter().any(|v| v.as_str() == name);
        let assignments = match kind {
            QueryKind::Construct => return Self::triples(),
            QueryKind::Ask => Vec::new(),
            QueryKind::Select => variables
                .iter()
                .filter_map(|variable| {
                    let role = match variable.as_str() {
                        "s" | "subject" => VariableRole::Subject,
                        "p" | "predicate" | "property" => VariableRole::Predicate,
                        "o" | "object" => VariableRole::Object,
                        _ => return None,
                    };
                    Some((variable.clone(), role))
                })
                .collect(),
            QueryKind::ShaclValidate => {
                let focus = Variable::new_unchecked("focusNode");
                let mut assignments = vec![(focus.clone(), VariableRole::Subject)];
                if has("resultPath") {
                    assignments.push((
                        Variable::new_unchecked("resultPath"),
                        VariableRole::Predicate,
                    ));
                }
                if has("value") {
                    assignments.push((Variable::new_unchecked("value"), VariableRole::Object));
                }
                for attribute in ["resultSeverity", "resultMessage", "sourceShape"] {
                    if has(attribute) {
                        assignments.push((
                            Variable::new_unchecked(attribute),
                            VariableRole::AttributeOf(focus.clone()),
                        ));
                    }
                }
                assignments
            }
        };
        Self { assignments }
    }

    /// Returns the role of `variable`.
    pub fn role(&self, variable: &str) -> &VariableRole {
        self.assignments
            .iter()
            .find(|(v, _)| v.as_str() == variable)
            .map_or(&VariableRole::Ignore, |(_, role)| role)
    }

    /// Iterates over the variables with the given role predicate, in assignment order.
    pub(crate) fn variables_with(
        &self,
        predicate: impl Fn(&VariableRole) -> bool,
    ) -> impl Iterator<Item = &Variable> {
        self.assignments
            .iter()
            .filter(move |(_, role)| predicate(role))
            .map(|(variable, _)| variable)
    }

    /// Iterates over all role assignments.
    pub fn assignments(&self) -> impl Iterator<Item = (&Variable, &VariableRole)> {
        self.assignments.iter().map(|(v, r)| (v, r))
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Builds validated [ProjectionRules].
#[derive(Debug, Default)]
pub struct ProjectionRulesBuilder {
    assignments: Vec<(String, SerializedRole)>,
}

impl ProjectionRulesBuilder {
    #[must_use]
    pub fn subject(self, variable: impl Into<String>) -> Self {
        self.assign(variable, SerializedRole::Subject)
    }

    #[must_use]
    pub fn object(self, variable: impl Into<String>) -> Self {
        self.assign(variable, SerializedRole::Object)
    }

    #[must_use]
    pub fn predicate(self, variable: impl Into<String>) -> Self {
        self.assign(variable, SerializedRole::Predicate)
    }

    #[must_use]
    pub fn ignore(self, variable: impl Into<String>) -> Self {
        self.assign(variable, SerializedRole::Ignore)
    }

    /// Attaches the value of `variable` as an attribute to the node bound by `node`.
    #[must_use]
    pub fn attribute_of(self, variable: impl Into<String>, node: impl Into<String>) -> Self {
        self.assign(variable, SerializedRole::AttributeOf(node.into()))
    }

    #[must_use]
    fn assign(mut self, variable: impl Into<String>, role: SerializedRole) -> Self {
        self.assignments.push((variable.into(), role));
        self
    }

    /// Validates the assignments.
    pub fn build(self) -> Result<ProjectionRules, ProjectionRuleError> {
        let assignments = self
            .assignments
            .into_iter()
            .map(|(variable, role)| RoleAssignment { variable, role })
            .collect::<Vec<_>>();
        ProjectionRules::try_from(assignments)
    }
}

/// The serialized form of a single role assignment, e.g.
/// `{ "variable": "name", "role": { "attribute_of": "s" } }`.
#[derive(Clone, Debug, Deserialize)]
pub struct RoleAssignment {
    variable: String,
    role: SerializedRole,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SerializedRole {
    Subject,
    Object,
    Predicate,
    Ignore,
    AttributeOf(String),
}

impl TryFrom<Vec<RoleAssignment>> for ProjectionRules {
    type Error = ProjectionRuleError;

    fn try_from(value: Vec<RoleAssignment>) -> Result<Self, Self::Error> {
        let mut assignments: Vec<(Variable, VariableRole)> = Vec::with_capacity(value.len());
        for RoleAssignment { variable, role } in &value {
            let variable = Variable::new(variable.trim_start_matches(['?', '$']))?;
            if assignments.iter().any(|(v, _)| *v == variable) {
                return Err(ProjectionRuleError::DuplicateVariable(
                    variable.into_string(),
                ));
            }
            let role = match role {
                SerializedRole::Subject => VariableRole::Subject,
                SerializedRole::Object => VariableRole::Object,
                SerializedRole::Predicate => VariableRole::Predicate,
                SerializedRole::Ignore => VariableRole::Ignore,
                SerializedRole::AttributeOf(target) => VariableRole::AttributeOf(Variable::new(
                    target.trim_start_matches(['?', '$']),
                )?),
            };
            assignments.push((variable, role));
        }

        for (variable, role) in &assignments {
            if let VariableRole::AttributeOf(target) = role {
                let target_is_node = assignments
                    .iter()
                    .any(|(v, r)| v == target && r.is_node());
                if !target_is_node {
                    return Err(ProjectionRuleError::AttributeTargetNotANode {
                        attribute: variable.as_str().to_owned(),
                        target: target.as_str().to_owned(),
                    });
                }
            }
        }

        Ok(Self { assignments })
    }
}
