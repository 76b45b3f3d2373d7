//! Declarative registry of providers per category.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::collector::provider::SourceProvider;
use crate::model::Category;

/// Malformed registry or configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("category '{0}' is not registered")]
    UnknownCategory(Category),

    #[error("category '{0}' has no providers")]
    NoProviders(Category),

    #[error("no categories requested")]
    NoCategories,

    #[error("provider name '{0}' is registered twice")]
    DuplicateName(String),

    #[error("providers '{first}' and '{second}' of '{category}' share priority {priority}")]
    DuplicatePriority {
        category: Category,
        priority: u32,
        first: String,
        second: String,
    },

    #[error("configuration refers to unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot load config file {path}: {message}")]
    ConfigFile { path: String, message: String },
}

/// A provider together with its effective priority and timeout.
#[derive(Clone)]
pub struct RegisteredProvider {
    provider: Arc<dyn SourceProvider>,
    priority: u32,
    timeout: Option<Duration>,
}

impl RegisteredProvider {
    pub fn provider(&self) -> &Arc<dyn SourceProvider> {
        &self.provider
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Effective priority after overrides.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Effective timeout override, falling back to the provider's own.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.or_else(|| self.provider.timeout())
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name())
            .field("category", &self.provider.category())
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Immutable mapping from category to providers ordered by ascending
/// priority.
#[derive(Debug, Clone)]
pub struct Registry {
    by_category: BTreeMap<Category, Vec<RegisteredProvider>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Providers for `category`, most trusted first.
    pub fn providers_for(
        &self,
        category: Category,
    ) -> Result<&[RegisteredProvider], ConfigurationError> {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .ok_or(ConfigurationError::UnknownCategory(category))
    }

    /// Registered categories in canonical order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.by_category.keys().copied()
    }

    /// Total number of registered providers.
    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}

/// Collects providers and policy, then validates them into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    providers: Vec<Arc<dyn SourceProvider>>,
    categories: Option<BTreeSet<Category>>,
    priorities: HashMap<String, u32>,
    timeouts: HashMap<String, Duration>,
    disabled: HashSet<String>,
}

impl RegistryBuilder {
    pub fn register(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn register_arc(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn register_all(mut self, providers: impl IntoIterator<Item = Arc<dyn SourceProvider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Restricts the registry to these categories. Defaults to all of them.
    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    /// Overrides the priority of a provider by name.
    pub fn priority(mut self, provider: impl Into<String>, priority: u32) -> Self {
        self.priorities.insert(provider.into(), priority);
        self
    }

    /// Overrides the timeout of a provider by name.
    pub fn timeout(mut self, provider: impl Into<String>, timeout: Duration) -> Self {
        self.timeouts.insert(provider.into(), timeout);
        self
    }

    /// Leaves a provider out of the registry.
    pub fn disable(mut self, provider: impl Into<String>) -> Self {
        self.disabled.insert(provider.into());
        self
    }

    /// Validates and freezes the registry.
    ///
    /// Providers of categories outside the declared set are dropped. Within a
    /// category, providers are sorted by priority; the sort is stable so equal
    /// keys would keep registration order, but equal priorities are rejected.
    pub fn build(self) -> Result<Registry, ConfigurationError> {
        let categories = self
            .categories
            .unwrap_or_else(|| Category::ALL.into_iter().collect());
        if categories.is_empty() {
            return Err(ConfigurationError::NoCategories);
        }

        let mut names = HashSet::new();
        for provider in &self.providers {
            if !names.insert(provider.name().to_string()) {
                return Err(ConfigurationError::DuplicateName(
                    provider.name().to_string(),
                ));
            }
        }
        for name in self
            .priorities
            .keys()
            .chain(self.timeouts.keys())
            .chain(self.disabled.iter())
        {
            if !names.contains(name) {
                return Err(ConfigurationError::UnknownProvider(name.clone()));
            }
        }

        let mut by_category: BTreeMap<Category, Vec<RegisteredProvider>> = categories
            .iter()
            .map(|c| (*c, Vec::new()))
            .collect();

        for provider in self.providers {
            if self.disabled.contains(provider.name()) {
                continue;
            }
            let Some(slot) = by_category.get_mut(&provider.category()) else {
                continue;
            };
            let priority = self
                .priorities
                .get(provider.name())
                .copied()
                .unwrap_or_else(|| provider.priority());
            let timeout = self.timeouts.get(provider.name()).copied();
            slot.push(RegisteredProvider {
                provider,
                priority,
                timeout,
            });
        }

        for (category, providers) in &mut by_category {
            if providers.is_empty() {
                return Err(ConfigurationError::NoProviders(*category));
            }
            providers.sort_by_key(RegisteredProvider::priority);
            if let Some(pair) = providers
                .windows(2)
                .find(|w| w[0].priority == w[1].priority)
            {
                return Err(ConfigurationError::DuplicatePriority {
                    category: *category,
                    priority: pair[0].priority,
                    first: pair[0].name().to_string(),
                    second: pair[1].name().to_string(),
                });
            }
        }

        Ok(Registry { by_category })
    }
}
