//! Extractor registry.
//!
//! A process-wide table mapping shop landing URLs to extractor
//! constructors. A shop binds to the unique entry whose URL equals the
//! shop URL exactly; zero or multiple matches are lookup errors surfaced
//! at driver construction.

use crate::error::RegistryError;
use crate::extract::Extractor;
use crate::sites;

type Constructor = Box<dyn Fn() -> Box<dyn Extractor> + Send + Sync>;

pub struct Registry {
    entries: Vec<(String, Constructor)>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The registry with every supported site registered.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(sites::solebox::URL, || {
            Box::new(sites::solebox::SoleboxExtractor)
        });
        registry.register(sites::footdistrict::URL, || {
            Box::new(sites::footdistrict::FootdistrictExtractor)
        });
        registry.register(sites::bstn::URL, || Box::new(sites::bstn::BstnExtractor));
        registry.register(sites::sneak_avenue::URL, || {
            Box::new(sites::sneak_avenue::SneakAvenueExtractor)
        });
        registry
    }

    /// Registers a constructor under a shop URL.
    pub fn register(
        &mut self,
        url: impl Into<String>,
        constructor: impl Fn() -> Box<dyn Extractor> + Send + Sync + 'static,
    ) {
        self.entries.push((url.into(), Box::new(constructor)));
    }

    /// Builds the extractor for a shop URL.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoMatch`] or [`RegistryError::Ambiguous`]
    /// when the URL matches zero or more than one entry.
    pub fn extractor_for(&self, shop_url: &str) -> Result<Box<dyn Extractor>, RegistryError> {
        let matches: Vec<&Constructor> = self
            .entries
            .iter()
            .filter(|(url, _)| url == shop_url)
            .map(|(_, constructor)| constructor)
            .collect();

        match matches.as_slice() {
            [] => Err(RegistryError::NoMatch {
                url: shop_url.to_owned(),
            }),
            [constructor] => Ok(constructor()),
            _ => Err(RegistryError::Ambiguous {
                url: shop_url.to_owned(),
                count: matches.len(),
            }),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
