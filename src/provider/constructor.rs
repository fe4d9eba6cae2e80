//! Constructors: functions whose parameters are dependencies and whose
//! results are new dependencies.

use std::fmt;

use crate::key::{derive_address, signature, Address, Identity, TypeDescriptor};
use crate::provider::output::{AnyArc, IntoOutputs, Param, Produced};

/// Why calling a constructor did not produce outputs.
#[derive(Debug)]
pub enum CallError {
    /// Argument at `index` did not downcast to the declared parameter type.
    Argument {
        index: usize,
        type_name: &'static str,
    },
    /// The constructor returned an error.
    Returned(anyhow::Error),
}

/// Any `Fn(Arc<P1>, .., Arc<Pn>) -> R` with up to eight parameters, where `R`
/// is one of the shapes accepted by [`IntoOutputs`].
///
/// `Args` and `M` are inferred; callers never name them.
pub trait Constructor<Args, M>: Send + Sync + Sized + 'static {
    /// Parameter descriptors, in declaration order.
    fn params() -> Vec<TypeDescriptor>;

    /// Output descriptors, in declaration order.
    fn outputs() -> Vec<TypeDescriptor>;

    /// Calls the constructor with already-resolved arguments.
    fn call(&self, args: &[AnyArc]) -> Result<Vec<Produced>, CallError>;
}

macro_rules! impl_constructor {
    ($($P:ident),*) => {
        impl<F, R, M, $($P),*> Constructor<($($P,)*), M> for F
        where
            F: Fn($($P),*) -> R + Send + Sync + 'static,
            R: IntoOutputs<M>,
            $($P: Param,)*
        {
            fn params() -> Vec<TypeDescriptor> {
                vec![$($P::descriptor()),*]
            }

            fn outputs() -> Vec<TypeDescriptor> {
                R::descriptors()
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, args: &[AnyArc]) -> Result<Vec<Produced>, CallError> {
                let mut args = args.iter();
                let mut index = 0usize;
                $(
                    let $P = args
                        .next()
                        .and_then(|arg| $P::extract(arg))
                        .ok_or(CallError::Argument {
                            index,
                            type_name: std::any::type_name::<$P>(),
                        })?;
                    index += 1;
                )*
                (self)($($P),*).into_outputs().map_err(CallError::Returned)
            }
        }
    };
}

impl_constructor!();
impl_constructor!(P1);
impl_constructor!(P1, P2);
impl_constructor!(P1, P2, P3);
impl_constructor!(P1, P2, P3, P4);
impl_constructor!(P1, P2, P3, P4, P5);
impl_constructor!(P1, P2, P3, P4, P5, P6);
impl_constructor!(P1, P2, P3, P4, P5, P6, P7);
impl_constructor!(P1, P2, P3, P4, P5, P6, P7, P8);

type Invoker = Box<dyn Fn(&[AnyArc]) -> Result<Vec<Produced>, CallError> + Send + Sync>;

/// A constructor with its signature captured and its type erased.
pub(crate) struct ConstructorHandle {
    identity: Identity,
    params: Vec<TypeDescriptor>,
    outputs: Vec<TypeDescriptor>,
    signature: String,
    invoke: Invoker,
}

impl ConstructorHandle {
    pub(crate) fn new<F, Args, M>(f: F) -> Self
    where
        F: Constructor<Args, M>,
    {
        let params = F::params();
        let outputs = F::outputs();
        let signature = signature(&params, &outputs);
        Self {
            identity: Identity::next(),
            params,
            outputs,
            signature,
            invoke: Box::new(move |args: &[AnyArc]| f.call(args)),
        }
    }

    pub(crate) fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::callable::<Self>(self.signature.clone())
    }

    /// Signature-plus-identity address; always a dependency.
    pub(crate) fn address(&self) -> Address {
        derive_address(&self.descriptor(), Some(self.identity)).0
    }

    pub(crate) fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    pub(crate) fn outputs(&self) -> &[TypeDescriptor] {
        &self.outputs
    }

    pub(crate) fn signature(&self) -> &str {
        &self.signature
    }

    pub(crate) fn call(&self, args: &[AnyArc]) -> Result<Vec<Produced>, CallError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for ConstructorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorHandle")
            .field("signature", &self.signature)
            .field("identity", &self.identity)
            .finish()
    }
}
