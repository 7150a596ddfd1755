//! JDWP vocabulary expressed through the generic codec.
//!
//! Nothing in here parses bytes by hand: replies and events are described as
//! [`Shape`](crate::codec::Shape)s in [`schema`], polymorphic bodies are
//! registered in [`default_registry`], and outbound payloads are built with
//! [`Seq`](crate::codec::Seq) and the [`Writable`](crate::codec::Writable)
//! types in this module.
//!
//! Object, thread, class, method and frame ids are assumed to be 8 bytes wide,
//! which is what HotSpot reports through `VirtualMachine.IDSizes`.

mod commands;
mod error_codes;
pub mod schema;
mod types;

pub use commands::{ClassRef, FrameRef, MethodRef};
pub use error_codes::{codes, error_table};
pub use schema::default_registry;
pub use types::{
    EventKind, EventRequestSet, Location, ModKind, Modifier, StepDepth, StepSize, SuspendPolicy,
    Tag, TypeTag,
};

/// Command set identifiers.
pub mod command_set {
    pub const VIRTUAL_MACHINE: u8 = 1;
    pub const REFERENCE_TYPE: u8 = 2;
    pub const CLASS_TYPE: u8 = 3;
    pub const ARRAY_TYPE: u8 = 4;
    pub const INTERFACE_TYPE: u8 = 5;
    pub const METHOD: u8 = 6;
    pub const FIELD: u8 = 8;
    pub const OBJECT_REFERENCE: u8 = 9;
    pub const STRING_REFERENCE: u8 = 10;
    pub const THREAD_REFERENCE: u8 = 11;
    pub const THREAD_GROUP_REFERENCE: u8 = 12;
    pub const ARRAY_REFERENCE: u8 = 13;
    pub const CLASS_LOADER_REFERENCE: u8 = 14;
    pub const EVENT_REQUEST: u8 = 15;
    pub const STACK_FRAME: u8 = 16;
    pub const CLASS_OBJECT_REFERENCE: u8 = 17;
    /// Set used by the VM for unsolicited events.
    pub const EVENT: u8 = 64;
}

/// VirtualMachine (1) commands.
pub mod virtual_machine {
    pub const VERSION: u8 = 1;
    pub const CLASSES_BY_SIGNATURE: u8 = 2;
    pub const ALL_CLASSES: u8 = 3;
    pub const ALL_THREADS: u8 = 4;
    pub const TOP_LEVEL_THREAD_GROUPS: u8 = 5;
    pub const DISPOSE: u8 = 6;
    pub const ID_SIZES: u8 = 7;
    pub const SUSPEND: u8 = 8;
    pub const RESUME: u8 = 9;
    pub const EXIT: u8 = 10;
    pub const CREATE_STRING: u8 = 11;
    pub const CAPABILITIES: u8 = 12;
    pub const CLASS_PATHS: u8 = 13;
    pub const DISPOSE_OBJECTS: u8 = 14;
    pub const HOLD_EVENTS: u8 = 15;
    pub const RELEASE_EVENTS: u8 = 16;
    pub const CAPABILITIES_NEW: u8 = 17;
    pub const REDEFINE_CLASSES: u8 = 18;
    pub const SET_DEFAULT_STRATUM: u8 = 19;
    pub const ALL_CLASSES_WITH_GENERIC: u8 = 20;
    pub const INSTANCE_COUNTS: u8 = 21;
}

/// ReferenceType (2) commands.
pub mod reference_type {
    pub const SIGNATURE: u8 = 1;
    pub const FIELDS: u8 = 4;
    pub const METHODS: u8 = 5;
}

/// Method (6) commands.
pub mod method {
    pub const LINE_TABLE: u8 = 1;
    pub const VARIABLE_TABLE: u8 = 2;
}

/// ObjectReference (9) commands.
pub mod object_reference {
    pub const REFERENCE_TYPE: u8 = 1;
    pub const CLASS_OBJECT: u8 = 11;
}

/// StringReference (10) commands.
pub mod string_reference {
    pub const VALUE: u8 = 1;
}

/// ThreadReference (11) commands.
pub mod thread_reference {
    pub const NAME: u8 = 1;
    pub const SUSPEND: u8 = 2;
    pub const RESUME: u8 = 3;
    pub const FRAMES: u8 = 6;
}

/// EventRequest (15) commands.
pub mod event_request {
    pub const SET: u8 = 1;
    pub const CLEAR: u8 = 2;
    pub const CLEAR_ALL_BREAKPOINTS: u8 = 3;
}

/// StackFrame (16) commands.
pub mod stack_frame {
    pub const GET_VALUES: u8 = 1;
}

/// Event (64) commands.
pub mod event {
    pub const COMPOSITE: u8 = 100;
}
