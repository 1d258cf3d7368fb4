use crate::RdfTerm;
use oxrdf::Variable;
use std::sync::Arc;

/// A single result row: an ordered mapping from variables to RDF terms.
///
/// Rows of the same result share their variable list. A variable that is not bound in this row
/// (e.g., because of an `OPTIONAL`) maps to no term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    variables: Arc<[Variable]>,
    values: Vec<Option<RdfTerm>>,
}

impl ResultRow {
    /// Creates a new row. `values[i]` is the binding of `variables[i]`.
    pub fn new(variables: Arc<[Variable]>, values: Vec<Option<RdfTerm>>) -> Self {
        Self { variables, values }
    }

    /// The variables of the result this row belongs to.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the term bound to the variable named `name`.
    pub fn get(&self, name: &str) -> Option<&RdfTerm> {
        let index = self.variables.iter().position(|v| v.as_str() == name)?;
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Iterates over the bound variables of this row in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &RdfTerm)> {
        self.variables
            .iter()
            .zip(&self.values)
            .filter_map(|(variable, value)| value.as_ref().map(|value| (variable, value)))
    }

    /// Returns the number of bound variables.
    pub fn bound_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl<T: Into<RdfTerm>> From<(Arc<[Variable]>, Vec<Option<T>>)> for ResultRow {
    #[inline]
    fn from((variables, values): (Arc<[Variable]>, Vec<Option<T>>)) -> Self {
        Self::new(
            variables,
            values.into_iter().map(|v| v.map(Into::into)).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    #[test]
    fn unbound_variables_are_skipped() {
        let variables: Arc<[Variable]> = Arc::new([
            Variable::new_unchecked("s"),
            Variable::new_unchecked("label"),
            Variable::new_unchecked("o"),
        ]);
        let row = ResultRow::new(
            variables,
            vec![
                Some(NamedNode::new_unchecked("http://example.com/A").into()),
                None,
                Some(Literal::new_simple_literal("B").into()),
            ],
        );

        assert_eq!(row.bound_count(), 2);
        assert!(row.get("label").is_none());
        assert!(row.get("missing").is_none());
        assert_eq!(row.get("o").map(RdfTerm::lexical), Some("B"));
        assert_eq!(
            row.iter().map(|(v, _)| v.as_str()).collect::<Vec<_>>(),
            vec!["s", "o"]
        );
    }
}
