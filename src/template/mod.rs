//! Template modules, the namespace they are imported into, and process assembly
//!
//! A template module is a named set of pre-populated parameter records, for example
//! `TrackingTools.MaterialEffects.MaterialPropagator`. An assembly script imports
//! modules into a [`Namespace`], copies the templates it wants to adjust and
//! overrides a few fields on the copies:
//!
//! ```text
//! import TrackingTools.MaterialEffects.MaterialPropagator
//! RungeKuttaTrackerPropagator = copy(MaterialPropagator)
//! RungeKuttaTrackerPropagator.useRungeKutta = true
//! ```

mod namespace;
mod registry;
mod resolver;

pub use namespace::{Namespace, ShadowPolicy, Shadowing, UnknownShadowPolicy};
pub use registry::{ModuleCatalog, RegistryError, TemplateModule};
pub use resolver::{assemble, resolve, AssemblyError, AssemblyOutcome, DEFAULT_PROCESS_NAME};
