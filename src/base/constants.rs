//! Namespace URIs and fixed names shared by the reader and the compiler.

/// The BPMN 2.0 model namespace.
pub const BPMN20_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
/// XML schema instance namespace (used for `xsi:type` on conditions).
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Diagram interchange namespaces.
pub const BPMN_DI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
pub const OMG_DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
pub const OMG_DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";

/// Vendor extension namespace.
pub const OPERATON_BPMN_EXTENSIONS_NS: &str = "http://operaton.org/schema/1.0/bpmn";
/// Legacy vendor extension namespace, accepted wherever the primary one is.
pub const CAMUNDA_BPMN_EXTENSIONS_NS: &str = "http://camunda.org/schema/1.0/bpmn";

/// Suffix appended to an activity id to name its multi-instance body.
pub const MULTI_INSTANCE_BODY_ID_SUFFIX: &str = "#multiInstanceBody";

/// Job configurations of asynchronous continuations.
pub const ASYNC_BEFORE: &str = "async-before";
pub const ASYNC_AFTER: &str = "async-after";

/// Default script language for scripts without a `scriptFormat`/`language`.
pub const DEFAULT_SCRIPT_LANGUAGE: &str = "juel";

/// Execution listener events.
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_TAKE: &str = "take";
