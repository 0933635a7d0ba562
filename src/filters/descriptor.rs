//! Filter descriptors: how to build a unit, wire it and drive its parameter.
//!
//! A descriptor is assembled through [`DescriptorBuilder<U>`], which is
//! generic over the concrete unit type. The parameter callback receives
//! `&mut U` and the custom wiring callback a typed [`UnitHandle<U>`], so a
//! callback written for the wrong unit type does not compile. The descriptor
//! itself stores the binding behind a trait object and never downcasts.

use crate::core::error::{CatalogError, EngineResult};
use crate::core::types::{FilterKind, ParameterRange};
use crate::engine::{Operation, SharedUnit, UnitHandle};
use crate::pipeline::wiring::WiringContext;
use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Range used when a descriptor has a parameter callback but no explicit range.
pub const DEFAULT_RANGE: ParameterRange = ParameterRange::new(0.0, 1.0, 0.0);

type Factory<U> = Arc<dyn Fn() -> U + Send + Sync>;
type ChangeCallback<U> = Arc<dyn Fn(&mut U, f32) + Send + Sync>;
type WiringCallback<U> =
    Arc<dyn Fn(&mut WiringContext<'_>, &UnitHandle<U>) -> EngineResult<()> + Send + Sync>;

// ============================================================================
// Type-erased binding
// ============================================================================

/// An instantiated unit together with its typed callbacks.
pub(crate) trait LiveUnit: Send {
    /// The unit as the engine holds it.
    fn shared(&self) -> SharedUnit;

    /// Input arity of the unit.
    fn inputs(&self) -> usize;

    /// Run the parameter callback. Returns false if there is none.
    fn apply(&self, value: f32) -> bool;

    /// Run the custom wiring callback. Does nothing if there is none.
    fn wire(&self, ctx: &mut WiringContext<'_>) -> EngineResult<()>;
}

trait UnitBinding: Send + Sync {
    fn instantiate(&self) -> Box<dyn LiveUnit>;
    fn declared_inputs(&self) -> usize;
}

struct TypedBinding<U> {
    factory: Factory<U>,
    on_change: Option<ChangeCallback<U>>,
    wiring: Option<WiringCallback<U>>,
}

impl<U: Operation> UnitBinding for TypedBinding<U> {
    fn instantiate(&self) -> Box<dyn LiveUnit> {
        Box::new(TypedUnit {
            handle: Arc::new(Mutex::new((self.factory)())),
            on_change: self.on_change.clone(),
            wiring: self.wiring.clone(),
        })
    }

    fn declared_inputs(&self) -> usize {
        (self.factory)().inputs()
    }
}

struct TypedUnit<U> {
    handle: UnitHandle<U>,
    on_change: Option<ChangeCallback<U>>,
    wiring: Option<WiringCallback<U>>,
}

impl<U: Operation> LiveUnit for TypedUnit<U> {
    fn shared(&self) -> SharedUnit {
        self.handle.clone()
    }

    fn inputs(&self) -> usize {
        self.handle.lock().inputs()
    }

    fn apply(&self, value: f32) -> bool {
        match &self.on_change {
            Some(callback) => {
                callback(&mut self.handle.lock(), value);
                true
            }
            None => false,
        }
    }

    fn wire(&self, ctx: &mut WiringContext<'_>) -> EngineResult<()> {
        match &self.wiring {
            Some(wiring) => wiring(ctx, &self.handle),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// One catalog entry.
pub struct FilterDescriptor {
    name: String,
    kind: FilterKind,
    range: Option<ParameterRange>,
    description: Option<String>,
    has_parameter_callback: bool,
    has_custom_wiring: bool,
    binding: Box<dyn UnitBinding>,
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("range", &self.range)
            .field("on_change", &self.has_parameter_callback.then_some("<callback>"))
            .field("wiring", &self.has_custom_wiring.then_some("<callback>"))
            .finish()
    }
}

impl FilterDescriptor {
    /// Start a descriptor of the given kind.
    pub fn builder<U, F>(name: impl Into<String>, kind: FilterKind, factory: F) -> DescriptorBuilder<U>
    where
        U: Operation,
        F: Fn() -> U + Send + Sync + 'static,
    {
        DescriptorBuilder {
            name: name.into(),
            kind,
            range: None,
            description: None,
            factory: Arc::new(factory),
            on_change: None,
            wiring: None,
            _unit: PhantomData,
        }
    }

    /// A unit with no inputs wired straight into the sink.
    pub fn generator<U, F>(name: impl Into<String>, factory: F) -> DescriptorBuilder<U>
    where
        U: Operation,
        F: Fn() -> U + Send + Sync + 'static,
    {
        Self::builder(name, FilterKind::Generator, factory)
    }

    /// source → unit → sink
    pub fn linear<U, F>(name: impl Into<String>, factory: F) -> DescriptorBuilder<U>
    where
        U: Operation,
        F: Fn() -> U + Send + Sync + 'static,
    {
        Self::builder(name, FilterKind::LinearChain, factory)
    }

    /// source → multi-stage unit → sink
    pub fn group<U, F>(name: impl Into<String>, factory: F) -> DescriptorBuilder<U>
    where
        U: Operation,
        F: Fn() -> U + Send + Sync + 'static,
    {
        Self::builder(name, FilterKind::CompositeGroup, factory)
    }

    /// The descriptor wires the graph itself; see [`DescriptorBuilder::wiring`].
    pub fn custom<U, F>(name: impl Into<String>, factory: F) -> DescriptorBuilder<U>
    where
        U: Operation,
        F: Fn() -> U + Send + Sync + 'static,
    {
        Self::builder(name, FilterKind::Custom, factory)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn range(&self) -> Option<ParameterRange> {
        self.range
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the control parameter does anything for this entry.
    pub fn has_parameter_callback(&self) -> bool {
        self.has_parameter_callback
    }

    pub fn has_custom_wiring(&self) -> bool {
        self.has_custom_wiring
    }

    /// Build a fresh unit instance.
    pub(crate) fn instantiate(&self) -> Box<dyn LiveUnit> {
        self.binding.instantiate()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Typed builder for a [`FilterDescriptor`].
pub struct DescriptorBuilder<U> {
    name: String,
    kind: FilterKind,
    range: Option<ParameterRange>,
    description: Option<String>,
    factory: Factory<U>,
    on_change: Option<ChangeCallback<U>>,
    wiring: Option<WiringCallback<U>>,
    _unit: PhantomData<fn() -> U>,
}

impl<U: Operation> DescriptorBuilder<U> {
    /// Bounds and initial value of the control parameter.
    pub fn range(mut self, min: f32, max: f32, default: f32) -> Self {
        self.range = Some(ParameterRange::new(min, max, default));
        self
    }

    /// Apply a control value to the unit.
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut U, f32) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Wire the graph for a `Custom` descriptor.
    ///
    /// The callback gets the primary source, the unit and the sink through the
    /// context and may add extra sources and units of its own.
    pub fn wiring<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut WiringContext<'_>, &UnitHandle<U>) -> EngineResult<()> + Send + Sync + 'static,
    {
        self.wiring = Some(Arc::new(callback));
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Check the descriptor contract and produce the descriptor.
    pub fn build(self) -> Result<FilterDescriptor, CatalogError> {
        let range = match (self.range, self.on_change.is_some()) {
            (Some(range), _) => Some(range),
            (None, true) => Some(DEFAULT_RANGE),
            (None, false) => None,
        };

        if let Some(range) = range {
            if !range.is_valid() {
                return Err(CatalogError::InvalidRange {
                    descriptor: self.name,
                    min: range.min,
                    max: range.max,
                    default: range.default,
                });
            }
        }

        match (self.kind, self.wiring.is_some()) {
            (FilterKind::Custom, false) => {
                return Err(CatalogError::MissingCustomWiring {
                    descriptor: self.name,
                })
            }
            (kind, true) if kind != FilterKind::Custom => {
                return Err(CatalogError::UnexpectedCustomWiring {
                    descriptor: self.name,
                    kind,
                })
            }
            _ => {}
        }

        let binding = TypedBinding {
            factory: self.factory,
            on_change: self.on_change,
            wiring: self.wiring,
        };

        if let Some(expected) = self.kind.expected_inputs() {
            let inputs = binding.declared_inputs();
            if inputs != expected {
                return Err(CatalogError::KindMismatch {
                    descriptor: self.name,
                    kind: self.kind,
                    inputs,
                });
            }
        }

        Ok(FilterDescriptor {
            name: self.name,
            kind: self.kind,
            range,
            description: self.description,
            has_parameter_callback: binding.on_change.is_some(),
            has_custom_wiring: binding.wiring.is_some(),
            binding: Box::new(binding),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Color, Size};
    use crate::operations::blend::{Blend, BlendMode};
    use crate::operations::color::{Brightness, ColorInversion};
    use crate::operations::generators::SolidColor;

    #[test]
    fn test_linear_descriptor() {
        let descriptor = FilterDescriptor::linear("Brightness", Brightness::default)
            .range(-1.0, 1.0, 0.0)
            .on_change(|unit, value| unit.brightness = value)
            .build()
            .unwrap();

        assert_eq!(descriptor.name(), "Brightness");
        assert_eq!(descriptor.kind(), FilterKind::LinearChain);
        assert_eq!(descriptor.range(), Some(ParameterRange::new(-1.0, 1.0, 0.0)));
        assert!(descriptor.has_parameter_callback());
        assert!(!descriptor.has_custom_wiring());
    }

    #[test]
    fn test_callback_reaches_typed_unit() {
        let descriptor = FilterDescriptor::generator("Solid", || {
            SolidColor::new(Size::new(2, 2), Color::BLACK)
        })
        .on_change(|unit, value| unit.color = Color::rgb(value, 0.0, 0.0))
        .build()
        .unwrap();

        // No explicit range: the default range applies.
        assert_eq!(descriptor.range(), Some(DEFAULT_RANGE));

        let live = descriptor.instantiate();
        assert!(live.apply(1.0));
        let image = live.shared().lock().render(&[]).unwrap();
        assert_eq!(image.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_no_callback_no_range() {
        let descriptor = FilterDescriptor::linear("ColorInversion", || ColorInversion)
            .build()
            .unwrap();
        assert_eq!(descriptor.range(), None);
        assert!(!descriptor.instantiate().apply(0.5));
    }

    #[test]
    fn test_custom_requires_wiring() {
        let result = FilterDescriptor::custom("BilateralBlur", Brightness::default)
            .range(0.0, 1.0, 0.0)
            .build();
        assert_eq!(
            result.unwrap_err(),
            CatalogError::MissingCustomWiring {
                descriptor: "BilateralBlur".to_string()
            }
        );
    }

    #[test]
    fn test_wiring_on_linear_is_rejected() {
        let result = FilterDescriptor::linear("Convolution3x3", || ColorInversion)
            .wiring(|ctx, _| {
                ctx.connect(ctx.source(), ctx.unit())?;
                ctx.connect(ctx.unit(), ctx.sink())
            })
            .build();
        assert!(matches!(
            result,
            Err(CatalogError::UnexpectedCustomWiring {
                kind: FilterKind::LinearChain,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_range() {
        let result = FilterDescriptor::linear("Broken", Brightness::default)
            .range(1.0, -1.0, 0.0)
            .on_change(|unit, value| unit.brightness = value)
            .build();
        assert!(matches!(result, Err(CatalogError::InvalidRange { .. })));
    }

    #[test]
    fn test_kind_arity_mismatch() {
        let result = FilterDescriptor::linear("Blend", || Blend::new(BlendMode::Add)).build();
        assert!(matches!(
            result,
            Err(CatalogError::KindMismatch { inputs: 2, .. })
        ));

        let result = FilterDescriptor::generator("NotAGenerator", || ColorInversion).build();
        assert!(matches!(
            result,
            Err(CatalogError::KindMismatch { inputs: 1, .. })
        ));
    }
}
