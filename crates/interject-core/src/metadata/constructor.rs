//! Constructor descriptions and argument access.

use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;
use crate::types::TypeKey;
use crate::{BoxError, Error, Result};

/// One constructor parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    ty: TypeKey,
    nullable: bool,
}

impl ParamInfo {
    /// A required parameter of type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    /// A required parameter with an explicit key.
    pub fn new(ty: TypeKey) -> Self {
        Self {
            ty,
            nullable: false,
        }
    }

    /// Mark the parameter as accepting an absent value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The parameter type.
    pub fn ty(&self) -> &TypeKey {
        &self.ty
    }

    /// Whether an absent value is acceptable.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Arguments handed to a constructor invoker, already cast to the
/// declared parameter types.
#[derive(Debug, Default)]
pub struct ConstructorArgs {
    values: Vec<Option<Instance>>,
}

impl ConstructorArgs {
    /// Wrap positional values.
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Self { values }
    }

    /// Number of positional values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw access to a positional value.
    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Required argument at `index`, downcast to `T`.
    pub fn arg<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        match self.get(index) {
            Some(instance) => instance.try_downcast::<T>(),
            None => Err(Error::config(format!(
                "constructor argument {index} ({}) is missing",
                std::any::type_name::<T>()
            ))),
        }
    }

    /// Optional argument at `index`, downcast to `T`.
    pub fn optional<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>> {
        self.get(index).map(Instance::try_downcast::<T>).transpose()
    }
}

type InvokeFn = dyn Fn(&ConstructorArgs) -> std::result::Result<Instance, BoxError> + Send + Sync;

/// A public constructor: its parameter list and an invoker.
#[derive(Clone)]
pub struct ConstructorInfo {
    params: Vec<ParamInfo>,
    invoke: Arc<InvokeFn>,
}

impl ConstructorInfo {
    /// Describe a constructor.
    pub fn new<F>(params: Vec<ParamInfo>, invoke: F) -> Self
    where
        F: Fn(&ConstructorArgs) -> std::result::Result<Instance, BoxError> + Send + Sync + 'static,
    {
        Self {
            params,
            invoke: Arc::new(invoke),
        }
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Run the constructor. User failures come back as
    /// [`Error::Construction`] with the original error inside.
    pub fn invoke(&self, values: Vec<Option<Instance>>) -> Result<Instance> {
        let args = ConstructorArgs::new(values);
        (self.invoke)(&args).map_err(Error::from_boxed)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
        write!(f, "ConstructorInfo({})", params.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("no more widgets")]
    struct OutOfWidgets;

    #[test]
    fn test_param_info_nullable() {
        let param = ParamInfo::of::<String>();
        assert!(!param.is_nullable());
        assert!(param.nullable().is_nullable());
    }

    #[test]
    fn test_constructor_args_access() {
        let args = ConstructorArgs::new(vec![Some(Instance::new(5u32)), None]);
        assert_eq!(args.len(), 2);
        assert_eq!(*args.arg::<u32>(0).unwrap(), 5);
        assert!(args.arg::<u32>(1).is_err());
        assert!(args.optional::<u32>(1).unwrap().is_none());
        assert!(args.arg::<String>(0).is_err());
    }

    #[test]
    fn test_constructor_invoke_success() {
        let ctor = ConstructorInfo::new(vec![ParamInfo::of::<u32>()], |args| {
            let n = args.arg::<u32>(0)?;
            Ok(Instance::new(format!("n={n}")))
        });
        assert_eq!(ctor.arity(), 1);
        let inst = ctor.invoke(vec![Some(Instance::new(3u32))]).unwrap();
        assert_eq!(*inst.downcast::<String>().unwrap(), "n=3");
    }

    #[test]
    fn test_constructor_invoke_user_error_is_kept() {
        let ctor = ConstructorInfo::new(vec![], |_| Err(Box::new(OutOfWidgets) as BoxError));
        let err = ctor.invoke(vec![]).unwrap_err();
        let source = err.construction_source().unwrap();
        assert!(source.downcast_ref::<OutOfWidgets>().is_some());
    }

    #[test]
    fn test_constructor_invoke_interject_error_passes_through() {
        let ctor = ConstructorInfo::new(vec![ParamInfo::of::<u8>()], |args| {
            args.arg::<String>(0)?;
            Ok(Instance::new(()))
        });
        let err = ctor.invoke(vec![Some(Instance::new(1u8))]).unwrap_err();
        assert!(matches!(err, Error::Cast { .. }));
    }
}
