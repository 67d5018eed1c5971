//! Propagation and flux model registry
//!
//! Models are registered by name with a factory and instantiated by index or name.
//! A [`ModelRegistry`] is an ordinary value owned by the simulation driver and handed
//! to domains on construction; there is no process-wide table.
//!
//! # Example
//!
//! ```rust
//! use firefront_core::config::SimulationParameters;
//! use firefront_core::models::ModelRegistry;
//!
//! let mut registry = ModelRegistry::default();
//! let params = SimulationParameters::default();
//! let model = registry.instantiate_propagation_by_name("Iso", &params).unwrap();
//! assert_eq!(model.name(), "Iso");
//! assert!(registry.instantiate_flux_by_name("Balbi", &params).is_err());
//! ```

mod heat_flux;
mod iso;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

pub use heat_flux::BasicHeatFlux;
pub use iso::IsotropicSpeed;
pub use r#trait::{FluxModel, PropagationModel};

use crate::config::SimulationParameters;
use crate::error::ModelError;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

/// Builds a propagation model from the simulation parameters
pub type PropagationFactory =
    Box<dyn Fn(&SimulationParameters) -> Box<dyn PropagationModel> + Send + Sync>;
/// Builds a flux model from the simulation parameters
pub type FluxFactory = Box<dyn Fn(&SimulationParameters) -> Box<dyn FluxModel> + Send + Sync>;

/// Name-indexed factories for both model families
pub struct ModelRegistry {
    propagation: Vec<(String, PropagationFactory)>,
    flux: Vec<(String, FluxFactory)>,
    /// Unknown names already reported, so each is logged once
    reported: FxHashSet<String>,
}

impl Default for ModelRegistry {
    /// Registry with the built-in `Iso` and `HeatFluxBasic` models.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_propagation(IsotropicSpeed::NAME, |params| {
            Box::new(IsotropicSpeed::new(params.iso_speed))
        });
        registry.register_flux(BasicHeatFlux::NAME, |_| Box::new(BasicHeatFlux::default()));
        registry
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("propagation", &self.propagation_names())
            .field("flux", &self.flux_names())
            .finish_non_exhaustive()
    }
}

impl ModelRegistry {
    /// Registry without any model.
    pub fn empty() -> Self {
        Self {
            propagation: Vec::new(),
            flux: Vec::new(),
            reported: FxHashSet::default(),
        }
    }

    /// Registers (or replaces) a propagation model and returns its index.
    pub fn register_propagation<F>(&mut self, name: &str, factory: F) -> usize
    where
        F: Fn(&SimulationParameters) -> Box<dyn PropagationModel> + Send + Sync + 'static,
    {
        debug!("Registering propagation model '{}'", name);
        register(&mut self.propagation, name, Box::new(factory))
    }

    /// Registers (or replaces) a flux model and returns its index.
    pub fn register_flux<F>(&mut self, name: &str, factory: F) -> usize
    where
        F: Fn(&SimulationParameters) -> Box<dyn FluxModel> + Send + Sync + 'static,
    {
        debug!("Registering flux model '{}'", name);
        register(&mut self.flux, name, Box::new(factory))
    }

    pub fn propagation_index(&self, name: &str) -> Option<usize> {
        self.propagation.iter().position(|(n, _)| n == name)
    }

    pub fn flux_index(&self, name: &str) -> Option<usize> {
        self.flux.iter().position(|(n, _)| n == name)
    }

    pub fn propagation_names(&self) -> Vec<&str> {
        self.propagation.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn flux_names(&self) -> Vec<&str> {
        self.flux.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// # Errors
    /// [`ModelError::UnknownIndex`] when nothing is registered at `index`.
    pub fn instantiate_propagation(
        &self,
        index: usize,
        params: &SimulationParameters,
    ) -> Result<Box<dyn PropagationModel>, ModelError> {
        self.propagation
            .get(index)
            .map(|(_, factory)| factory(params))
            .ok_or(ModelError::UnknownIndex(index))
    }

    /// # Errors
    /// [`ModelError::UnknownIndex`] when nothing is registered at `index`.
    pub fn instantiate_flux(
        &self,
        index: usize,
        params: &SimulationParameters,
    ) -> Result<Box<dyn FluxModel>, ModelError> {
        self.flux
            .get(index)
            .map(|(_, factory)| factory(params))
            .ok_or(ModelError::UnknownIndex(index))
    }

    /// Instantiates by name. Unknown names are logged once per registry.
    ///
    /// # Errors
    /// [`ModelError::UnknownName`] when `name` is not registered.
    pub fn instantiate_propagation_by_name(
        &mut self,
        name: &str,
        params: &SimulationParameters,
    ) -> Result<Box<dyn PropagationModel>, ModelError> {
        match self.propagation_index(name) {
            Some(index) => self.instantiate_propagation(index, params),
            None => Err(self.unknown(name, "propagation")),
        }
    }

    /// Instantiates by name. Unknown names are logged once per registry.
    ///
    /// # Errors
    /// [`ModelError::UnknownName`] when `name` is not registered.
    pub fn instantiate_flux_by_name(
        &mut self,
        name: &str,
        params: &SimulationParameters,
    ) -> Result<Box<dyn FluxModel>, ModelError> {
        match self.flux_index(name) {
            Some(index) => self.instantiate_flux(index, params),
            None => Err(self.unknown(name, "flux")),
        }
    }

    fn unknown(&mut self, name: &str, family: &str) -> ModelError {
        if self.reported.insert(name.to_string()) {
            warn!(
                "{} model '{}' is not registered; dependent features are disabled",
                family, name
            );
        }
        ModelError::UnknownName(name.to_string())
    }
}

fn register<T>(table: &mut Vec<(String, T)>, name: &str, factory: T) -> usize {
    if let Some(index) = table.iter().position(|(n, _)| n == name) {
        table[index].1 = factory;
        return index;
    }
    table.push((name.to_string(), factory));
    table.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_models_registered() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.propagation_index("Iso"), Some(0));
        assert_eq!(registry.flux_index("HeatFluxBasic"), Some(0));
    }

    #[test]
    fn test_factory_reads_parameters() {
        let mut registry = ModelRegistry::default();
        let params = SimulationParameters {
            iso_speed: 0.25,
            ..Default::default()
        };
        let model = registry
            .instantiate_propagation_by_name("Iso", &params)
            .unwrap();
        let marker = crate::perimeter::Marker::new(
            crate::core_types::AtomId::new(0, 1),
            crate::core_types::Point::zeros(),
            0.0,
        );
        assert_eq!(model.speed_for_marker(&marker), 0.25);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut registry = ModelRegistry::default();
        let index = registry.register_propagation("Iso", |_| Box::new(IsotropicSpeed::new(3.0)));
        assert_eq!(index, 0);
        assert_eq!(registry.propagation_names(), vec!["Iso"]);
    }

    #[test]
    fn test_unknown_names_error() {
        let mut registry = ModelRegistry::default();
        let params = SimulationParameters::default();
        for _ in 0..2 {
            let err = registry
                .instantiate_propagation_by_name("Rothermel", &params)
                .err()
                .unwrap();
            assert_eq!(err, ModelError::UnknownName("Rothermel".to_string()));
        }
        assert_eq!(registry.reported.len(), 1);
        assert!(registry.instantiate_flux(4, &params).is_err());
    }
}
