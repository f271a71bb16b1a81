//! Turning handler values into response bodies.
//!
//! # Responsibilities
//! - Define the renderer contract
//! - Try renderers innermost first and fall back to plain text
//!
//! # Design Decisions
//! - A renderer declines with `Ok(false)`; an `Err` aborts rendering
//! - `TextRenderer` accepts every value, so the chain always commits

use std::sync::Arc;

use crate::pipeline::context::Context;
use crate::pipeline::failure::Failure;
use crate::pipeline::handler::Value;

pub trait Renderer: Send + Sync + 'static {
    /// Render `value` into `ctx`, or return `false` to let the next one try.
    fn render(&self, ctx: &mut Context, value: &Value) -> Result<bool, Failure>;
}

impl<F> Renderer for F
where
    F: Fn(&mut Context, &Value) -> Result<bool, Failure> + Send + Sync + 'static,
{
    fn render(&self, ctx: &mut Context, value: &Value) -> Result<bool, Failure> {
        self(ctx, value)
    }
}

/// Fallback renderer: text as-is, bytes as octet-stream, JSON serialized.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, ctx: &mut Context, value: &Value) -> Result<bool, Failure> {
        match value {
            Value::Empty => ctx.send(Vec::new())?,
            Value::Text(text) => {
                ctx.set_default_content_type("text/plain; charset=utf-8")?;
                ctx.send(text.as_bytes())?;
            }
            Value::Bytes(bytes) => {
                ctx.set_default_content_type("application/octet-stream")?;
                ctx.send(bytes.as_slice())?;
            }
            Value::Json(json) => {
                ctx.set_default_content_type("application/json")?;
                ctx.send(serde_json::to_vec(json)?)?;
            }
        }
        Ok(true)
    }
}

/// Renders only JSON values.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, ctx: &mut Context, value: &Value) -> Result<bool, Failure> {
        let Value::Json(json) = value else {
            return Ok(false);
        };
        let body = if self.pretty {
            serde_json::to_vec_pretty(json)?
        } else {
            serde_json::to_vec(json)?
        };
        ctx.set_content_type("application/json")?;
        ctx.send(body)?;
        Ok(true)
    }
}

/// Renderers for one route, most recently declared first.
#[derive(Clone, Default)]
pub struct RendererChain {
    renderers: Vec<Arc<dyn Renderer>>,
}

impl RendererChain {
    /// Build from renderers in declaration order (outermost first).
    pub fn new(declared: Vec<Arc<dyn Renderer>>) -> Self {
        let mut renderers = declared;
        renderers.reverse();
        Self { renderers }
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn render(&self, ctx: &mut Context, value: &Value) -> Result<(), Failure> {
        for renderer in &self.renderers {
            if renderer.render(ctx, value)? {
                return Ok(());
            }
        }
        TextRenderer.render(ctx, value)?;
        Ok(())
    }
}
