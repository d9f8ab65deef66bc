//! Contract of the parameter store: the firmware object that owns every
//! tunable parameter and spot value. The engine only borrows it.
use crate::core::{Fixed, ParamId};
use crate::error::ParamError;

/// Typed access to parameters by enumerated index or stable unique id.
///
/// Methods take `&self`: the store is shared between foreground code and
/// interrupt handlers and is expected to manage its own interior mutability.
pub trait ParamStore {
    /// Number of enumerated parameters (valid indices are `0..count`).
    fn count(&self) -> u16;

    /// `true` when `param` is a settable parameter, `false` for spot values
    /// and unknown indices.
    fn is_param(&self, param: ParamId) -> bool;

    /// Current value.
    fn get(&self, param: ParamId) -> Fixed;

    /// Range-checked set of a parameter.
    fn set(&self, param: ParamId, value: Fixed) -> Result<(), ParamError>;

    /// Unchecked set, used for spot values fed from the bus.
    fn set_fixed(&self, param: ParamId, value: Fixed);

    /// Stable unique id of `param`, if it has one.
    fn unique_id(&self, param: ParamId) -> Option<u16>;

    /// Enumerated index currently carrying the unique id `uid`.
    #[allow(clippy::wrong_self_convention)]
    fn from_unique_id(&self, uid: u16) -> Option<ParamId>;
}
