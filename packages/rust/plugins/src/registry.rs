//! Name → constructor lookup for configured plugins.

use docsetbuilder_core::{Plugin, PluginDescriptor};
use docsetbuilder_shared::{DocsetError, PluginConfig, Result};

use crate::{CommandPlugin, HtmlPlugin, StaticPlugin};

/// Builds a fresh plugin instance.
pub type PluginFactory = fn() -> Box<dyn Plugin>;

struct Registration {
    name: &'static str,
    description: &'static str,
    factory: PluginFactory,
}

/// Holds registered plugins in registration order.
pub struct PluginRegistry {
    plugins: Vec<Registration>,
}

impl PluginRegistry {
    /// Create a registry with all built-in plugins.
    pub fn new() -> Self {
        let mut registry = Self {
            plugins: Vec::new(),
        };
        registry.register(
            "static",
            "include a directory and return entries listed in the options",
            || Box::new(StaticPlugin),
        );
        registry.register(
            "html",
            "one entry per HTML page, titled by a CSS selector",
            || Box::new(HtmlPlugin),
        );
        registry.register(
            "command",
            "run an external program that answers with JSON entries",
            || Box::new(CommandPlugin),
        );
        registry
    }

    /// Add (or replace) a plugin under `name`.
    pub fn register(&mut self, name: &'static str, description: &'static str, factory: PluginFactory) {
        let registration = Registration {
            name,
            description,
            factory,
        };
        match self.plugins.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = registration,
            None => self.plugins.push(registration),
        }
    }

    /// `(name, description)` of every registered plugin.
    pub fn describe(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.plugins.iter().map(|r| (r.name, r.description))
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Plugin>> {
        self.plugins
            .iter()
            .find(|r| r.name == name)
            .map(|r| (r.factory)())
            .ok_or_else(|| {
                let known: Vec<_> = self.plugins.iter().map(|r| r.name).collect();
                DocsetError::config(format!(
                    "unknown plugin '{name}' (available: {})",
                    known.join(", ")
                ))
            })
    }

    /// Instantiate every `[[plugins]]` entry, keeping configured order.
    pub fn instantiate(&self, configs: &[PluginConfig]) -> Result<Vec<PluginDescriptor>> {
        configs
            .iter()
            .map(|config| {
                Ok(PluginDescriptor {
                    plugin: self.create(&config.name)?,
                    options: config.options.clone(),
                    use_as_index: config.use_as_index,
                })
            })
            .collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
