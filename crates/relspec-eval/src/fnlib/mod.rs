//! Builtin functions.
//!
//! | Name | Arguments |
//! |---|---|
//! | `append` | `(list, x, …)` |
//! | `coalesce` | `(x, …)` |
//! | `concat` | `(x, …)` |
//! | `convertMarkdown` | `(to, content)` or `{to, content}` |
//! | `equals`, `notEquals` | `(a, b)` |
//! | `exists` | `(x)` |
//! | `jsonMarshal`, `jsonUnmarshal` | `(x)` |
//! | `merge` | `(obj, …)` or `{objects, mode}` |
//! | `now` | `()` |
//! | `path` | `(object, query, default?)` or `{object, query, default}` |
//! | `toString` | `(x)` |

mod collections;
mod logic;
mod markdown;
mod path;
mod strings;
mod time;

pub use markdown::to_jira;

use std::rc::Rc;

use relspec_types::{EvalError, EvalResult, Map, ReferenceId, Value};

use crate::func::Library;

/// Add every builtin to `library`.
pub fn register_standard<R: ReferenceId>(library: &mut Library<R>) {
    library.register("append", Rc::new(collections::Append));
    library.register("coalesce", Rc::new(logic::Coalesce));
    library.register("concat", Rc::new(strings::Concat));
    library.register("convertMarkdown", Rc::new(markdown::ConvertMarkdown));
    library.register("equals", Rc::new(logic::Equals { negate: false }));
    library.register("exists", Rc::new(logic::Exists));
    library.register("jsonMarshal", Rc::new(strings::JsonMarshal));
    library.register("jsonUnmarshal", Rc::new(strings::JsonUnmarshal));
    library.register("merge", Rc::new(collections::Merge));
    library.register("notEquals", Rc::new(logic::Equals { negate: true }));
    library.register("now", Rc::new(time::Now));
    library.register("path", Rc::new(path::Path::new()));
    library.register("toString", Rc::new(strings::Stringify));
}

// ── Argument helpers ─────────────────────────────────────────────────────────

fn string_arg<R: ReferenceId>(value: &Value<R>) -> EvalResult<&str> {
    value
        .as_str()
        .ok_or_else(|| EvalError::unexpected_type(&["string"], value.type_name()))
}

fn map_arg<R: ReferenceId>(value: &Value<R>) -> EvalResult<&Map<R>> {
    value
        .as_map()
        .ok_or_else(|| EvalError::unexpected_type(&["map"], value.type_name()))
}
