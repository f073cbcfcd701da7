use std::sync::{Arc, Mutex};

use auxswitch_host::sim::SimHost;
use auxswitch_host::{ControlObject, InvokeError, MethodSignature, Value, ValueKind};

use super::{find_method, lock};
use crate::vendor::topway::TWUTIL_CLASS;

#[derive(Debug)]
struct State {
    calls: Vec<String>,
    open_rc: i32,
    write_rc: i32,
    open_with_flag: bool,
    instances: usize,
}

/// Simulated `TWUtil` framework class. Every instance shares one call log.
#[derive(Debug, Clone)]
pub struct TopwayDevice {
    state: Arc<Mutex<State>>,
}

impl TopwayDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                open_rc: 0,
                write_rc: 0,
                open_with_flag: true,
                instances: 0,
            })),
        }
    }

    pub fn with_open_rc(self, rc: i32) -> Self {
        lock(&self.state).open_rc = rc;
        self
    }

    pub fn with_write_rc(self, rc: i32) -> Self {
        lock(&self.state).write_rc = rc;
        self
    }

    /// Older builds only declare `open(short[])`.
    pub fn without_open_flag(self) -> Self {
        lock(&self.state).open_with_flag = false;
        self
    }

    pub fn install(&self, host: &SimHost) {
        let state = self.state.clone();
        host.add_class(
            TWUTIL_CLASS,
            Arc::new(move || {
                lock(&state).instances += 1;
                Arc::new(TwUtil {
                    state: state.clone(),
                }) as Arc<dyn ControlObject>
            }),
        );
    }

    /// Calls in order, rendered as `name(args)`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn instances(&self) -> usize {
        lock(&self.state).instances
    }
}

impl Default for TopwayDevice {
    fn default() -> Self {
        Self::new()
    }
}

struct TwUtil {
    state: Arc<Mutex<State>>,
}

fn render(method: &str, args: &[Value]) -> String {
    let args: Vec<String> = args
        .iter()
        .map(|arg| match arg {
            Value::ShortArray(ids) => format!("{ids:?}"),
            other => other
                .as_integer()
                .map_or_else(|| format!("{other:?}"), |v| v.to_string()),
        })
        .collect();
    format!("{method}({})", args.join(", "))
}

impl ControlObject for TwUtil {
    fn class_name(&self) -> &str {
        TWUTIL_CLASS
    }

    fn methods(&self) -> Vec<MethodSignature> {
        let open = if lock(&self.state).open_with_flag {
            MethodSignature::new("open", &[ValueKind::ShortArray, ValueKind::Int], ValueKind::Int)
        } else {
            MethodSignature::new("open", &[ValueKind::ShortArray], ValueKind::Int)
        };
        vec![
            open,
            MethodSignature::new("start", &[], ValueKind::Void),
            MethodSignature::new("stop", &[], ValueKind::Void),
            MethodSignature::new("close", &[], ValueKind::Void),
            MethodSignature::new("write", &[ValueKind::Int, ValueKind::Int], ValueKind::Int),
            MethodSignature::new(
                "write",
                &[ValueKind::Int, ValueKind::Int, ValueKind::Int],
                ValueKind::Int,
            ),
        ]
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        let methods = self.methods();
        let signature = find_method(&methods, method, args)?;
        let mut state = lock(&self.state);
        state.calls.push(render(method, args));
        Ok(match signature.returns {
            ValueKind::Int if method == "open" => Value::Int(state.open_rc),
            ValueKind::Int => Value::Int(state.write_rc),
            _ => Value::Void,
        })
    }
}
