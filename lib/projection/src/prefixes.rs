use serde::Deserialize;

/// Maps namespace IRIs to short prefixes for labelling.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct PrefixMap {
    /// `(prefix, namespace)` pairs, longest namespace first.
    bindings: Vec<(String, String)>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with the prefixes of the vocabularies that show up in almost every graph.
    pub fn with_common_prefixes() -> Self {
        let mut map = Self::new();
        map.insert("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        map.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        map.insert("owl", "http://www.w3.org/2002/07/owl#");
        map.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        map.insert("sh", "http://www.w3.org/ns/shacl#");
        map
    }

    /// Binds `prefix` to `namespace`, replacing an earlier binding of the same prefix.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        self.bindings.retain(|(p, _)| *p != prefix);
        self.bindings.push((prefix, namespace.into()));
        self.bindings
            .sort_by(|(_, a), (_, b)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    }

    /// Returns `prefix:local` for `iri` if a namespace matches and the remainder is a plausible
    /// local name.
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.bindings.iter().find_map(|(prefix, namespace)| {
            let local = iri.strip_prefix(namespace.as_str())?;
            let plausible = !local.is_empty()
                && !local.contains(['/', '#', '?', ' ', '<', '>']);
            plausible.then(|| format!("{prefix}:{local}"))
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl From<Vec<(String, String)>> for PrefixMap {
    fn from(bindings: Vec<(String, String)>) -> Self {
        let mut map = Self::new();
        for (prefix, namespace) in bindings {
            map.insert(prefix, namespace);
        }
        map
    }
}
