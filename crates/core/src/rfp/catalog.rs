use std::collections::HashSet;

/// Canonical product names, matched case-insensitively and ignoring
/// surrounding whitespace. Anything not listed is a custom product.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    names: HashSet<String>,
}

impl Catalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| catalog_key(name.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();

        Self { names }
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names.extend(
            names.into_iter().map(|name| catalog_key(name.as_ref())).filter(|key| !key.is_empty()),
        );
    }

    pub fn contains(&self, product_spec: &str) -> bool {
        self.names.contains(&catalog_key(product_spec))
    }

    pub fn is_custom(&self, product_spec: &str) -> bool {
        !self.contains(product_spec)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn catalog_key(name: &str) -> String {
    name.trim().to_lowercase()
}
