//! The capability registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use conduit_types::{CapabilityDescriptor, CapabilityKind, CapabilitySchema};

use crate::error::RegistryError;
use crate::handler::CapabilityHandler;
use crate::uri_template::UriTemplate;

struct Entry {
    descriptor: CapabilityDescriptor,
    handler: Arc<dyn CapabilityHandler>,
    template: Option<UriTemplate>,
}

/// A successful lookup.
pub struct Resolved<'a> {
    /// The descriptor passed to `register`.
    pub descriptor: &'a CapabilityDescriptor,
    /// The handler passed to `register`.
    pub handler: &'a Arc<dyn CapabilityHandler>,
    /// Variables bound from the URI (empty unless a resource).
    pub bindings: BTreeMap<String, String>,
}

/// Immutable map from `(kind, name)` to descriptor and handler.
#[derive(Default)]
pub struct CapabilityRegistry {
    /// Registration order across all kinds.
    entries: Vec<Entry>,
    index: HashMap<(CapabilityKind, String), usize>,
}

impl CapabilityRegistry {
    /// Starts a registration phase.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: Self::default(),
        }
    }

    /// All descriptors of `kind`, in registration order.
    pub fn list_all(&self, kind: CapabilityKind) -> Vec<&CapabilityDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.kind == kind)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Whether any capability of `kind` is registered.
    pub fn has(&self, kind: CapabilityKind) -> bool {
        self.entries.iter().any(|e| e.descriptor.kind == kind)
    }

    /// Number of registered capabilities across all kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a capability.
    ///
    /// Tools and prompts resolve by exact name. Resources resolve by
    /// matching `identifier` (a URI) against every registered template;
    /// the most specific match wins and ties go to the earliest
    /// registration.
    pub fn resolve(
        &self,
        kind: CapabilityKind,
        identifier: &str,
    ) -> Result<Resolved<'_>, RegistryError> {
        let not_found = || RegistryError::NotFound {
            kind,
            name: identifier.to_string(),
        };

        if kind != CapabilityKind::Resource {
            let idx = self
                .index
                .get(&(kind, identifier.to_string()))
                .ok_or_else(not_found)?;
            let entry = &self.entries[*idx];
            return Ok(Resolved {
                descriptor: &entry.descriptor,
                handler: &entry.handler,
                bindings: BTreeMap::new(),
            });
        }

        let mut best: Option<(usize, &Entry, BTreeMap<String, String>)> = None;
        for entry in &self.entries {
            let Some(template) = &entry.template else {
                continue;
            };
            let Some(bindings) = template.matches(identifier) else {
                continue;
            };
            let score = template.specificity();
            if best.as_ref().map_or(true, |(s, _, _)| score > *s) {
                best = Some((score, entry, bindings));
            }
        }

        let (_, entry, bindings) = best.ok_or_else(not_found)?;
        Ok(Resolved {
            descriptor: &entry.descriptor,
            handler: &entry.handler,
            bindings,
        })
    }
}

/// Mutable registration phase; [`RegistryBuilder::build`] freezes it.
pub struct RegistryBuilder {
    registry: CapabilityRegistry,
}

impl RegistryBuilder {
    /// Registers a capability under `(descriptor.kind, descriptor.name)`.
    ///
    /// Fails with `DuplicateName` if the pair is taken; the existing
    /// registration is left untouched.
    pub fn register(
        &mut self,
        descriptor: CapabilityDescriptor,
        handler: Arc<dyn CapabilityHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let key = (descriptor.kind, descriptor.name.clone());
        if self.registry.index.contains_key(&key) {
            return Err(RegistryError::DuplicateName {
                kind: descriptor.kind,
                name: descriptor.name,
            });
        }

        let template = match (&descriptor.kind, &descriptor.schema) {
            (CapabilityKind::Resource, CapabilitySchema::Template { uri_template, .. }) => {
                Some(UriTemplate::parse(uri_template).map_err(|source| {
                    RegistryError::InvalidTemplate {
                        name: descriptor.name.clone(),
                        source,
                    }
                })?)
            }
            (CapabilityKind::Tool, CapabilitySchema::Input(_))
            | (CapabilityKind::Prompt, CapabilitySchema::Arguments(_)) => None,
            _ => {
                return Err(RegistryError::SchemaMismatch {
                    kind: descriptor.kind,
                    name: descriptor.name,
                })
            }
        };

        debug!(kind = %descriptor.kind, name = %descriptor.name, "registered capability");
        self.registry.index.insert(key, self.registry.entries.len());
        self.registry.entries.push(Entry {
            descriptor,
            handler,
            template,
        });
        Ok(self)
    }

    /// Freezes the registry.
    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}
