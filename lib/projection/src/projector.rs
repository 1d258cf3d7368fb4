use crate::anomaly::{AnomalyKind, ProjectionAnomaly};
use crate::prefixes::PrefixMap;
use crate::rules::{ProjectionRules, VariableRole};
use rdf_lens_model::{
    Attributes, EdgeKey, ElementId, GraphElement, RdfTerm, ResultRow, TermKey, Variable,
    VisualEdge, VisualNode,
};
use rustc_hash::FxHashMap;

/// The graph elements projected from a single row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    /// The projected elements. Each identity occurs at most once.
    pub elements: Vec<GraphElement>,
    /// Terms that could only be projected on a best-effort basis.
    pub anomalies: Vec<ProjectionAnomaly>,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Projects result rows onto graph elements.
///
/// For each row, the projector produces
/// 1. a node for every bound subject and object variable (in rule order),
/// 2. the attributes of these nodes, and
/// 3. an edge from every bound subject to every bound object for every bound predicate.
///
/// Rows without a bound predicate produce no edges.
#[derive(Clone, Debug, Default)]
pub struct GraphProjector {
    rules: ProjectionRules,
    prefixes: PrefixMap,
}

impl GraphProjector {
    pub fn new(rules: ProjectionRules, prefixes: PrefixMap) -> Self {
        Self { rules, prefixes }
    }

    pub fn rules(&self) -> &ProjectionRules {
        &self.rules
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Projects `row`. The result only depends on `row` and the configuration of the projector.
    pub fn project(&self, row: &ResultRow) -> Projection {
        let mut builder = ProjectionBuilder::default();

        for variable in self.rules.variables_with(VariableRole::is_node) {
            let Some(term) = row.get(variable.as_str()) else {
                continue;
            };
            if term.is_unrecognized() {
                builder.anomaly(AnomalyKind::UnrecognizedTerm, variable, term);
            } else if term.is_literal() && self.rules.role(variable.as_str()) == &VariableRole::Subject
            {
                builder.anomaly(AnomalyKind::LiteralSubject, variable, term);
            }
            builder.push(self.node(term));
        }

        for (variable, role) in self.rules.assignments() {
            let VariableRole::AttributeOf(target) = role else {
                continue;
            };
            let (Some(value), Some(node)) = (row.get(variable.as_str()), row.get(target.as_str()))
            else {
                continue;
            };
            if value.is_unrecognized() {
                builder.anomaly(AnomalyKind::UnrecognizedTerm, variable, value);
            }
            let attributes = Attributes::from([(variable.as_str().to_owned(), self.label(value))]);
            builder.merge(ElementId::Node(TermKey::of(node)), attributes);
        }

        let subjects = self.bound(row, VariableRole::Subject);
        let objects = self.bound(row, VariableRole::Object);
        for predicate_variable in self
            .rules
            .variables_with(|role| role == &VariableRole::Predicate)
        {
            let Some(predicate) = row.get(predicate_variable.as_str()) else {
                continue;
            };
            if predicate.is_unrecognized() {
                builder.anomaly(AnomalyKind::UnrecognizedTerm, predicate_variable, predicate);
            } else if !predicate.is_iri() {
                builder.anomaly(AnomalyKind::NonIriPredicate, predicate_variable, predicate);
            }
            for subject in &subjects {
                for object in &objects {
                    builder.push(self.edge(subject, predicate, object));
                }
            }
        }

        builder.finish()
    }

    fn bound<'row>(&self, row: &'row ResultRow, role: VariableRole) -> Vec<&'row RdfTerm> {
        self.rules
            .variables_with(|r| *r == role)
            .filter_map(|variable| row.get(variable.as_str()))
            .collect()
    }

    fn node(&self, term: &RdfTerm) -> GraphElement {
        let mut attributes = Attributes::new();
        attributes.insert("kind".to_owned(), term.kind().as_str().to_owned());
        if let RdfTerm::Literal(literal) = term {
            match literal.language() {
                Some(language) => {
                    attributes.insert("language".to_owned(), language.to_owned());
                }
                None => {
                    attributes.insert(
                        "datatype".to_owned(),
                        self.iri_label(literal.datatype().as_str()),
                    );
                }
            }
        }

        GraphElement::Node(VisualNode {
            key: TermKey::of(term),
            label: self.label(term),
            attributes,
        })
    }

    fn edge(&self, subject: &RdfTerm, predicate: &RdfTerm, object: &RdfTerm) -> GraphElement {
        GraphElement::Edge(VisualEdge {
            key: EdgeKey {
                source: TermKey::of(subject),
                label: TermKey::of(predicate),
                target: TermKey::of(object),
            },
            label: self.label(predicate),
            attributes: Attributes::from([(
                "predicate".to_owned(),
                predicate.lexical().to_owned(),
            )]),
        })
    }

    /// Returns the display label of `term`.
    pub fn label(&self, term: &RdfTerm) -> String {
        match term {
            RdfTerm::Iri(node) => self.iri_label(node.as_str()),
            RdfTerm::Literal(literal) => literal.value().to_owned(),
            RdfTerm::BlankNode(node) => format!("_:{}", node.as_str()),
            RdfTerm::Unrecognized(raw) => raw.clone(),
        }
    }

    fn iri_label(&self, iri: &str) -> String {
        self.prefixes
            .compact(iri)
            .unwrap_or_else(|| iri.to_owned())
    }
}

#[derive(Default)]
struct ProjectionBuilder {
    elements: Vec<GraphElement>,
    positions: FxHashMap<ElementId, usize>,
    anomalies: Vec<ProjectionAnomaly>,
}

impl ProjectionBuilder {
    fn push(&mut self, element: GraphElement) {
        let id = element.id();
        match self.positions.get(&id) {
            Some(&position) => {
                self.elements[position].merge_attributes(element.into_attributes());
            }
            None => {
                self.positions.insert(id, self.elements.len());
                self.elements.push(element);
            }
        }
    }

    fn merge(&mut self, id: ElementId, attributes: Attributes) {
        if let Some(&position) = self.positions.get(&id) {
            self.elements[position].merge_attributes(attributes);
        }
    }

    fn anomaly(&mut self, kind: AnomalyKind, variable: &Variable, term: &RdfTerm) {
        self.anomalies.push(ProjectionAnomaly {
            kind,
            variable: variable.as_str().to_owned(),
            raw: term.to_string(),
        });
    }

    fn finish(self) -> Projection {
        Projection {
            elements: self.elements,
            anomalies: self.anomalies,
        }
    }
}
