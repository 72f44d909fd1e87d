use std::any::TypeId;

use crate::error::Result;
use crate::value::{Namespace, Value};

/// One reflected function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Param {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// A function whose signature and documentation can drive a parser.
///
/// Implemented by the marker types generated with `#[doclap::command]`, but
/// can be written by hand as well.
pub trait Function: 'static {
    type Output: Into<Value>;

    const NAME: &'static str;

    /// The raw (not yet dedented) documentation block.
    fn doc() -> &'static str;

    /// Parameters in declaration order.
    fn signature() -> Vec<Param>;

    fn call(namespace: &Namespace) -> Result<Self::Output>;
}

#[derive(Clone, Copy)]
pub(crate) struct FunctionEntry {
    pub id: TypeId,
    pub name: &'static str,
    pub dispatch: fn(&Namespace) -> Result<Value>,
}

impl FunctionEntry {
    pub(crate) fn of<F: Function>() -> Self {
        FunctionEntry {
            id: TypeId::of::<F>(),
            name: F::NAME,
            dispatch: dispatch::<F>,
        }
    }
}

impl std::fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FunctionEntry").field(&self.name).finish()
    }
}

fn dispatch<F: Function>(namespace: &Namespace) -> Result<Value> {
    F::call(namespace).map(Into::into)
}
