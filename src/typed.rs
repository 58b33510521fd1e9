//! Typed handlers: parse → handle → envelope.
//!
//! A [`TypedHandler`] erases a handler over a concrete input type `T` and
//! response type `R`, keeping both shapes so the document generator can
//! describe the operation the handler serves.

use crate::envelope::{response_wrapper, ResponseWrapper};
use crate::error::to_error_result;
use crate::parser::{self, Instance};
use crate::request::SchemaRequest;
use crate::schema::{describe, Describe, SchemaDescriptor, TypeShape};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Trait implemented by typed request handlers.
pub trait Handler: Send + Sync + 'static {
    /// Input schema, deserialized from the validated instance
    type Request: Describe + DeserializeOwned;
    /// Payload placed in the success envelope
    type Response: Describe + Serialize;

    fn handle(&self, req: &SchemaRequest, input: Self::Request) -> anyhow::Result<Self::Response>;
}

/// Status and enveloped JSON body produced by serving a request.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

type ErasedCall = dyn Fn(&SchemaRequest, &Instance) -> anyhow::Result<Value> + Send + Sync;

/// Type-erased handler together with its input and response shapes.
#[derive(Clone)]
pub struct TypedHandler {
    input: TypeShape,
    output: TypeShape,
    descriptor: SchemaDescriptor,
    call: Arc<ErasedCall>,
}

impl TypedHandler {
    pub fn from_handler<H: Handler>(handler: H) -> Self {
        let input = H::Request::describe();
        let descriptor = describe(&input);
        let call = move |req: &SchemaRequest, instance: &Instance| -> anyhow::Result<Value> {
            let typed: H::Request = instance.deserialize()?;
            let out = handler.handle(req, typed)?;
            Ok(serde_json::to_value(out)?)
        };
        Self {
            input,
            output: H::Response::describe(),
            descriptor,
            call: Arc::new(call),
        }
    }

    pub fn input_shape(&self) -> &TypeShape {
        &self.input
    }

    pub fn output_shape(&self) -> &TypeShape {
        &self.output
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Serve with the process-wide envelope.
    pub fn serve(&self, req: &SchemaRequest) -> HandlerResponse {
        self.serve_with(req, response_wrapper())
    }

    /// Parse the request, run the handler and wrap the outcome.
    ///
    /// Parse and handler failures both answer 400 with the mapped error pair.
    pub fn serve_with(&self, req: &SchemaRequest, wrapper: &dyn ResponseWrapper) -> HandlerResponse {
        let instance = match parser::parse(&self.descriptor, req) {
            Ok(instance) => instance,
            Err(err) => {
                debug!(path = %req.path, code = err.code(), "Request rejected by schema");
                return HandlerResponse::error(400, wrapper.wrap_error(err.code(), &err.message()));
            }
        };
        match (self.call)(req, &instance) {
            Ok(data) => HandlerResponse::ok(wrapper.wrap_success(data)),
            Err(err) => {
                let info = to_error_result(&err);
                debug!(path = %req.path, code = %info.code, "Handler returned error");
                HandlerResponse::error(400, wrapper.wrap_error(&info.code, &info.message))
            }
        }
    }
}

impl fmt::Debug for TypedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHandler")
            .field("input", &self.descriptor.name)
            .field("output", &self.output.kind())
            .finish()
    }
}

struct FnHandler<T, R, F> {
    f: F,
    _types: std::marker::PhantomData<fn(T) -> R>,
}

impl<T, R, F> Handler for FnHandler<T, R, F>
where
    T: Describe + DeserializeOwned + 'static,
    R: Describe + Serialize + 'static,
    F: Fn(&SchemaRequest, T) -> anyhow::Result<R> + Send + Sync + 'static,
{
    type Request = T;
    type Response = R;

    fn handle(&self, req: &SchemaRequest, input: T) -> anyhow::Result<R> {
        (self.f)(req, input)
    }
}

/// Build a [`TypedHandler`] from a closure.
///
/// ```rust
/// use routeschema::schema::{Describe, FieldShape, RecordShape, TypeShape};
/// use routeschema::typed::handler;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Echo {
///     message: String,
/// }
///
/// impl Describe for Echo {
///     fn describe() -> TypeShape {
///         RecordShape::named("Echo")
///             .field(FieldShape::of::<String>("Message").validate("required"))
///             .into()
///     }
/// }
///
/// let h = handler(|_req, input: Echo| Ok(input.message));
/// assert_eq!(h.descriptor().query.len(), 1);
/// ```
pub fn handler<T, R, F>(f: F) -> TypedHandler
where
    T: Describe + DeserializeOwned + 'static,
    R: Describe + Serialize + 'static,
    F: Fn(&SchemaRequest, T) -> anyhow::Result<R> + Send + Sync + 'static,
{
    TypedHandler::from_handler(FnHandler {
        f,
        _types: std::marker::PhantomData,
    })
}
