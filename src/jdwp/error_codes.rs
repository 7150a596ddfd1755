//! JDWP reply error codes and the [`ErrorTable`] that names them.
//!
//! [`error_table`] maps every documented code to its message, so a non-zero
//! reply code resolves to a readable
//! [`JdwpError::Application`](crate::JdwpError::Application).

use crate::error::ErrorTable;

/// Reply error codes.
pub mod codes {
    pub const NONE: u16 = 0;
    pub const INVALID_THREAD: u16 = 10;
    pub const INVALID_THREAD_GROUP: u16 = 11;
    pub const INVALID_PRIORITY: u16 = 12;
    pub const THREAD_NOT_SUSPENDED: u16 = 13;
    pub const THREAD_SUSPENDED: u16 = 14;
    pub const THREAD_NOT_ALIVE: u16 = 15;
    pub const INVALID_OBJECT: u16 = 20;
    pub const INVALID_CLASS: u16 = 21;
    pub const CLASS_NOT_PREPARED: u16 = 22;
    pub const INVALID_METHODID: u16 = 23;
    pub const INVALID_LOCATION: u16 = 24;
    pub const INVALID_FIELDID: u16 = 25;
    pub const INVALID_FRAMEID: u16 = 30;
    pub const NO_MORE_FRAMES: u16 = 31;
    pub const OPAQUE_FRAME: u16 = 32;
    pub const NOT_CURRENT_FRAME: u16 = 33;
    pub const TYPE_MISMATCH: u16 = 34;
    pub const INVALID_SLOT: u16 = 35;
    pub const DUPLICATE: u16 = 40;
    pub const NOT_FOUND: u16 = 41;
    pub const INVALID_MONITOR: u16 = 50;
    pub const NOT_MONITOR_OWNER: u16 = 51;
    pub const INTERRUPT: u16 = 52;
    pub const NOT_IMPLEMENTED: u16 = 99;
    pub const NULL_POINTER: u16 = 100;
    pub const ABSENT_INFORMATION: u16 = 101;
    pub const INVALID_EVENT_TYPE: u16 = 102;
    pub const ILLEGAL_ARGUMENT: u16 = 103;
    pub const OUT_OF_MEMORY: u16 = 110;
    pub const ACCESS_DENIED: u16 = 111;
    pub const VM_DEAD: u16 = 112;
    pub const INTERNAL: u16 = 113;
    pub const UNATTACHED_THREAD: u16 = 115;
    pub const INVALID_TAG: u16 = 500;
    pub const ALREADY_INVOKING: u16 = 502;
    pub const INVALID_INDEX: u16 = 503;
    pub const INVALID_LENGTH: u16 = 504;
    pub const INVALID_STRING: u16 = 506;
    pub const INVALID_CLASS_LOADER: u16 = 507;
    pub const INVALID_ARRAY: u16 = 508;
    pub const TRANSPORT_LOAD: u16 = 509;
    pub const TRANSPORT_INIT: u16 = 510;
    pub const NATIVE_METHOD: u16 = 511;
    pub const INVALID_COUNT: u16 = 512;
}

/// Error table with the messages for every documented reply code.
pub fn error_table() -> ErrorTable {
    use codes::*;

    [
        (INVALID_THREAD, "passed thread is null, is not a valid thread or has exited"),
        (INVALID_THREAD_GROUP, "thread group invalid"),
        (INVALID_PRIORITY, "invalid priority"),
        (THREAD_NOT_SUSPENDED, "the specified thread has not been suspended by an event"),
        (THREAD_SUSPENDED, "thread already suspended"),
        (THREAD_NOT_ALIVE, "thread has not been started or is now dead"),
        (INVALID_OBJECT, "invalid object"),
        (INVALID_CLASS, "invalid class"),
        (CLASS_NOT_PREPARED, "class has been loaded but not yet prepared"),
        (INVALID_METHODID, "invalid method"),
        (INVALID_LOCATION, "invalid location"),
        (INVALID_FIELDID, "invalid field"),
        (INVALID_FRAMEID, "invalid frame id"),
        (NO_MORE_FRAMES, "there are no more Java or JNI frames on the call stack"),
        (OPAQUE_FRAME, "information about the frame is not available"),
        (NOT_CURRENT_FRAME, "operation can only be performed on current frame"),
        (TYPE_MISMATCH, "the variable is not an appropriate type for the function used"),
        (INVALID_SLOT, "invalid slot"),
        (DUPLICATE, "item already set"),
        (NOT_FOUND, "desired element not found"),
        (INVALID_MONITOR, "invalid monitor"),
        (NOT_MONITOR_OWNER, "this thread doesn't own the monitor"),
        (INTERRUPT, "the call has been interrupted before completion"),
        (NOT_IMPLEMENTED, "the functionality is not implemented in this virtual machine"),
        (NULL_POINTER, "invalid pointer"),
        (ABSENT_INFORMATION, "desired information is not available"),
        (INVALID_EVENT_TYPE, "the specified event type id is not recognized"),
        (ILLEGAL_ARGUMENT, "illegal argument"),
        (OUT_OF_MEMORY, "the function needed to allocate memory and no more memory was available"),
        (ACCESS_DENIED, "debugging has not been enabled in this virtual machine"),
        (VM_DEAD, "the virtual machine is not running"),
        (INTERNAL, "an unexpected internal error has occurred"),
        (UNATTACHED_THREAD, "the thread being used to call this function is not attached to the virtual machine"),
        (INVALID_TAG, "invalid object type id or class tag"),
        (ALREADY_INVOKING, "previous invoke not complete"),
        (INVALID_INDEX, "index is invalid"),
        (INVALID_LENGTH, "the length is invalid"),
        (INVALID_STRING, "the string is invalid"),
        (INVALID_CLASS_LOADER, "the class loader is invalid"),
        (INVALID_ARRAY, "the array is invalid"),
        (TRANSPORT_LOAD, "unable to load the transport"),
        (TRANSPORT_INIT, "unable to initialize the transport"),
        (NATIVE_METHOD, "native method"),
        (INVALID_COUNT, "the count is invalid"),
    ]
    .into_iter()
    .fold(ErrorTable::new(), |table, (code, message)| table.with(code, message))
}
