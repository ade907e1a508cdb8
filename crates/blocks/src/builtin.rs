//! Built-in block library, registered under the `builtin` module name.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};
use tracing::debug;

use crate::traits::{require, require_f64, require_i64, require_str};
use crate::{
    Arguments, BlockError, BlockRegistry, BlockSignature, ExecutableBlock, InvocationContext,
    OutputPort, Param, ValueType,
};

/// Registry name for the built-in library.
pub const BUILTIN_MODULE: &str = "builtin";

/// Variable key the `reply` block appends to.
pub const REPLIES_KEY: &str = "replies";

/// Build the built-in registry.
pub fn registry() -> BlockRegistry {
    let mut reg = BlockRegistry::new(BUILTIN_MODULE);

    reg.register_sync(
        BlockSignature::new("random_int")
            .label("Random Number")
            .doc("Pick a random integer between low and high, both inclusive.")
            .param(Param::required("low", ValueType::Number).describe("smallest possible value"))
            .param(Param::optional("high", ValueType::Number, 10).describe("largest possible value"))
            .returns(ValueType::Number),
        random_int,
    );

    reg.register_sync(
        BlockSignature::new("add")
            .label("Add")
            .doc("Sum of two numbers.")
            .param(Param::required("a", ValueType::Number))
            .param(Param::required("b", ValueType::Number))
            .returns(ValueType::Number),
        |args, _| arithmetic(&args, i64::checked_add, |a, b| a + b),
    );

    reg.register_sync(
        BlockSignature::new("multiply")
            .label("Multiply")
            .doc("Product of two numbers.")
            .param(Param::required("a", ValueType::Number))
            .param(Param::required("b", ValueType::Number))
            .returns(ValueType::Number),
        |args, _| arithmetic(&args, i64::checked_mul, |a, b| a * b),
    );

    reg.register_sync(
        BlockSignature::new("divmod")
            .label("Divide")
            .doc("Integer division returning quotient and remainder.")
            .param(Param::required("a", ValueType::Number))
            .param(Param::required("b", ValueType::Number))
            .output(OutputPort::new("quotient", ValueType::Number))
            .output(OutputPort::new("remainder", ValueType::Number)),
        divmod,
    );

    reg.register_sync(
        BlockSignature::new("format_text")
            .label("Format Text")
            .doc("Replace every `{}` in template with value.")
            .param(Param::required("template", ValueType::String))
            .param(Param::optional("value", ValueType::Any, Value::Null))
            .returns(ValueType::String),
        format_text,
    );

    reg.register_sync(
        BlockSignature::new("get_variable")
            .label("Get Variable")
            .doc("Read a variable, falling back to default when unset.")
            .param(Param::required("name", ValueType::String))
            .param(Param::optional("default", ValueType::Any, Value::Null))
            .returns(ValueType::Any),
        |args, ctx| {
            let name = require_str(&args, "name")?;
            Ok(ctx
                .variables
                .get(name)
                .unwrap_or_else(|| args.get("default").cloned().unwrap_or(Value::Null)))
        },
    );

    reg.register_sync(
        BlockSignature::new("set_variable")
            .label("Set Variable")
            .doc("Store a variable and pass the value through.")
            .param(Param::required("name", ValueType::String))
            .param(Param::required("value", ValueType::Any))
            .returns(ValueType::Any),
        |args, ctx| {
            let name = require_str(&args, "name")?;
            let value = require(&args, "value")?.clone();
            ctx.variables.set(name, value.clone());
            Ok(value)
        },
    );

    reg.register_sync(
        BlockSignature::new("echo_context")
            .label("Echo Context")
            .doc("Return every argument received, including ambient values.")
            .accepts_extra()
            .returns(ValueType::Any),
        |args, _| Ok(Value::Object(args)),
    );

    reg.register_async(
        BlockSignature::new("sleep")
            .label("Sleep")
            .doc("Wait for the given number of milliseconds.")
            .param(Param::required("ms", ValueType::Number))
            .returns(ValueType::Number),
        SleepBlock,
    );

    reg.register_async(
        BlockSignature::new("reply")
            .label("Send Reply")
            .doc("Reply to the triggering event with a text message.")
            .param(Param::required("text", ValueType::String))
            .param(Param::optional("event", ValueType::Any, Value::Null))
            .output(OutputPort::new("sent", ValueType::Boolean)),
        ReplyBlock,
    );

    reg
}

// ---------------------------------------------------------------------------
// Synchronous blocks
// ---------------------------------------------------------------------------

fn random_int(args: Arguments, _ctx: &InvocationContext) -> Result<Value, BlockError> {
    let low = require_i64(&args, "low")?;
    let high = require_i64(&args, "high")?;
    if low > high {
        return Err(BlockError::invalid(
            "high",
            format!("upper bound {high} is below lower bound {low}"),
        ));
    }
    Ok(json!(rand::thread_rng().gen_range(low..=high)))
}

/// Integer arithmetic when both operands are integers, float otherwise.
fn arithmetic(
    args: &Arguments,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, BlockError> {
    let a = require(args, "a")?;
    let b = require(args, "b")?;
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return int_op(x, y)
            .map(Value::from)
            .ok_or_else(|| BlockError::Failed(format!("integer overflow on {x} and {y}")));
    }
    let x = require_f64(args, "a")?;
    let y = require_f64(args, "b")?;
    let result = float_op(x, y);
    if !result.is_finite() {
        return Err(BlockError::Failed(format!("result of {x} and {y} is not a finite number")));
    }
    Ok(json!(result))
}

fn divmod(args: Arguments, _ctx: &InvocationContext) -> Result<Value, BlockError> {
    let a = require_i64(&args, "a")?;
    let b = require_i64(&args, "b")?;
    if b == 0 {
        return Err(BlockError::invalid("b", "division by zero"));
    }
    Ok(json!({
        "quotient": a.div_euclid(b),
        "remainder": a.rem_euclid(b),
    }))
}

fn format_text(args: Arguments, _ctx: &InvocationContext) -> Result<Value, BlockError> {
    let template = require_str(&args, "template")?;
    let rendered = match args.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    Ok(Value::String(template.replace("{}", &rendered)))
}

// ---------------------------------------------------------------------------
// Asynchronous blocks
// ---------------------------------------------------------------------------

pub struct SleepBlock;

#[async_trait]
impl ExecutableBlock for SleepBlock {
    async fn invoke(&self, args: Arguments, _ctx: &InvocationContext) -> Result<Value, BlockError> {
        let ms = require_i64(&args, "ms")?;
        let ms = u64::try_from(ms).map_err(|_| BlockError::invalid("ms", "must not be negative"))?;
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(json!(ms))
    }
}

/// Records a reply to the triggering event in the `replies` variable.
///
/// Delivery to a chat platform is up to whoever drains that variable.
pub struct ReplyBlock;

#[async_trait]
impl ExecutableBlock for ReplyBlock {
    async fn invoke(&self, args: Arguments, ctx: &InvocationContext) -> Result<Value, BlockError> {
        let text = require_str(&args, "text")?;
        let event = args.get("event").cloned().unwrap_or(Value::Null);
        debug!(node_id = %ctx.node_id, run_id = %ctx.run_id, "queueing reply");
        ctx.variables.push(
            REPLIES_KEY,
            json!({ "run_id": ctx.run_id, "node_id": ctx.node_id, "text": text, "event": event }),
        );
        Ok(json!(true))
    }
}
