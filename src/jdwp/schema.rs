//! Reply and event shapes.
//!
//! Field names follow the protocol documentation (camelCase), so decoded
//! records read the same as the reference tables.

use crate::codec::{field, Field, Shape, TagRegistry};

use super::types::{EventKind, Tag};

/// Family name for tagged values (`B`, `I`, `L`, ...).
pub const VALUE_FAMILY: &str = "value";

/// Family name for composite event bodies, keyed by event kind.
pub const EVENT_FAMILY: &str = "event";

/// `{typeTag: u8, classId: u64, methodId: u64, index: u64}`
pub fn location() -> Shape {
    Shape::record([
        field("typeTag", Shape::U8),
        field("classId", Shape::U64),
        field("methodId", Shape::U64),
        field("index", Shape::U64),
    ])
}

/// Tagged value, resolved through [`VALUE_FAMILY`].
pub fn tagged_value() -> Shape {
    Shape::tagged(VALUE_FAMILY)
}

/// Body of `Event.Composite`.
pub fn composite() -> Shape {
    Shape::record([
        field("suspendPolicy", Shape::U8),
        field("eventCount", Shape::I32),
        field("events", Shape::sequence("eventCount", Shape::tagged(EVENT_FAMILY))),
    ])
}

pub fn version() -> Shape {
    Shape::record([
        field("description", Shape::String),
        field("jdwpMajor", Shape::I32),
        field("jdwpMinor", Shape::I32),
        field("vmVersion", Shape::String),
        field("vmName", Shape::String),
    ])
}

pub fn id_sizes() -> Shape {
    Shape::record([
        field("fieldIDSize", Shape::I32),
        field("methodIDSize", Shape::I32),
        field("objectIDSize", Shape::I32),
        field("referenceTypeIDSize", Shape::I32),
        field("frameIDSize", Shape::I32),
    ])
}

pub fn classes_by_signature() -> Shape {
    Shape::record([
        field("classes", Shape::I32),
        field(
            "details",
            Shape::sequence(
                "classes",
                Shape::record([
                    field("refTypeTag", Shape::U8),
                    field("typeID", Shape::U64),
                    field("status", Shape::I32),
                ]),
            ),
        ),
    ])
}

pub fn all_threads() -> Shape {
    Shape::record([
        field("threads", Shape::I32),
        field("ids", Shape::sequence("threads", Shape::U64)),
    ])
}

pub fn signature() -> Shape {
    Shape::record([field("signature", Shape::String)])
}

pub fn fields() -> Shape {
    Shape::record([
        field("declared", Shape::I32),
        field(
            "fields",
            Shape::sequence(
                "declared",
                Shape::record([
                    field("fieldID", Shape::U64),
                    field("name", Shape::String),
                    field("signature", Shape::String),
                    field("modBits", Shape::I32),
                ]),
            ),
        ),
    ])
}

pub fn methods() -> Shape {
    Shape::record([
        field("declared", Shape::I32),
        field(
            "methods",
            Shape::sequence(
                "declared",
                Shape::record([
                    field("methodID", Shape::U64),
                    field("name", Shape::String),
                    field("signature", Shape::String),
                    field("modBits", Shape::I32),
                ]),
            ),
        ),
    ])
}

pub fn line_table() -> Shape {
    Shape::record([
        field("start", Shape::I64),
        field("end", Shape::I64),
        field("lines", Shape::I32),
        field(
            "entries",
            Shape::sequence(
                "lines",
                Shape::record([
                    field("lineCodeIndex", Shape::I64),
                    field("lineNumber", Shape::I32),
                ]),
            ),
        ),
    ])
}

pub fn variable_table() -> Shape {
    Shape::record([
        field("argCnt", Shape::I32),
        field("slots", Shape::I32),
        field(
            "vars",
            Shape::sequence(
                "slots",
                Shape::record([
                    field("codeIndex", Shape::U64),
                    field("name", Shape::String),
                    field("signature", Shape::String),
                    field("length", Shape::U32),
                    field("slot", Shape::I32),
                ]),
            ),
        ),
    ])
}

pub fn thread_name() -> Shape {
    Shape::record([field("threadName", Shape::String)])
}

pub fn frames() -> Shape {
    Shape::record([
        field("frames", Shape::I32),
        field(
            "items",
            Shape::sequence(
                "frames",
                Shape::record([field("frameID", Shape::U64), field("location", location())]),
            ),
        ),
    ])
}

pub fn get_values() -> Shape {
    Shape::record([
        field("values", Shape::I32),
        field("items", Shape::sequence("values", tagged_value())),
    ])
}

pub fn string_value() -> Shape {
    Shape::record([field("stringValue", Shape::String)])
}

pub fn reference_type() -> Shape {
    Shape::record([field("refTypeTag", Shape::U8), field("typeID", Shape::U64)])
}

pub fn class_object() -> Shape {
    Shape::record([field("classObject", Shape::U64)])
}

pub fn event_request_set() -> Shape {
    Shape::record([field("requestID", Shape::I32)])
}

fn request_thread() -> Vec<Field> {
    vec![field("requestId", Shape::I32), field("thread", Shape::U64)]
}

fn request_thread_location() -> Vec<Field> {
    let mut fields = request_thread();
    fields.push(field("location", location()));
    fields
}

fn extended(mut fields: Vec<Field>, extra: impl IntoIterator<Item = Field>) -> Shape {
    fields.extend(extra);
    Shape::Record(fields)
}

/// Registry with every tagged value and composite event body.
pub fn default_registry() -> TagRegistry {
    let mut registry = TagRegistry::new();

    for (tag, name, shape) in [
        (Tag::Array, "array", Shape::U64),
        (Tag::Byte, "byte", Shape::U8),
        (Tag::Char, "char", Shape::U16),
        (Tag::Object, "object", Shape::U64),
        (Tag::Float, "float", Shape::F32),
        (Tag::Double, "double", Shape::F64),
        (Tag::Int, "int", Shape::I32),
        (Tag::Long, "long", Shape::I64),
        (Tag::Short, "short", Shape::I16),
        (Tag::Void, "void", Shape::unit()),
        (Tag::Boolean, "boolean", Shape::Bool),
        (Tag::String, "string", Shape::U64),
        (Tag::Thread, "thread", Shape::U64),
        (Tag::ThreadGroup, "threadGroup", Shape::U64),
        (Tag::ClassLoader, "classLoader", Shape::U64),
        (Tag::ClassObject, "classObject", Shape::U64),
    ] {
        registry.register(VALUE_FAMILY, tag.as_u8(), name, shape);
    }

    let object = || field("object", tagged_value());
    for (kind, shape) in [
        (EventKind::SingleStep, Shape::Record(request_thread_location())),
        (EventKind::Breakpoint, Shape::Record(request_thread_location())),
        (EventKind::FramePop, Shape::Record(request_thread_location())),
        (
            EventKind::Exception,
            extended(
                request_thread_location(),
                [field("exception", tagged_value()), field("catchLocation", location())],
            ),
        ),
        (EventKind::ThreadStart, Shape::Record(request_thread())),
        (EventKind::ThreadDeath, Shape::Record(request_thread())),
        (
            EventKind::ClassPrepare,
            extended(
                request_thread(),
                [
                    field("refTypeTag", Shape::U8),
                    field("typeID", Shape::U64),
                    field("signature", Shape::String),
                    field("status", Shape::I32),
                ],
            ),
        ),
        (
            EventKind::ClassUnload,
            Shape::record([field("requestId", Shape::I32), field("signature", Shape::String)]),
        ),
        (
            EventKind::FieldAccess,
            extended(
                request_thread_location(),
                [
                    field("refTypeTag", Shape::U8),
                    field("typeID", Shape::U64),
                    field("fieldID", Shape::U64),
                    object(),
                ],
            ),
        ),
        (
            EventKind::FieldModification,
            extended(
                request_thread_location(),
                [
                    field("refTypeTag", Shape::U8),
                    field("typeID", Shape::U64),
                    field("fieldID", Shape::U64),
                    object(),
                    field("valueToBe", tagged_value()),
                ],
            ),
        ),
        (EventKind::MethodEntry, Shape::Record(request_thread_location())),
        (EventKind::MethodExit, Shape::Record(request_thread_location())),
        (
            EventKind::MethodExitWithReturnValue,
            extended(request_thread_location(), [field("value", tagged_value())]),
        ),
        (
            EventKind::MonitorContendedEnter,
            extended(request_thread(), [object(), field("location", location())]),
        ),
        (
            EventKind::MonitorContendedEntered,
            extended(request_thread(), [object(), field("location", location())]),
        ),
        (
            EventKind::MonitorWait,
            extended(
                request_thread(),
                [object(), field("location", location()), field("timeout", Shape::I64)],
            ),
        ),
        (
            EventKind::MonitorWaited,
            extended(
                request_thread(),
                [object(), field("location", location()), field("timedOut", Shape::Bool)],
            ),
        ),
        (EventKind::VmStart, Shape::Record(request_thread())),
        (
            EventKind::VmDeath,
            Shape::record([field("requestId", Shape::I32)]),
        ),
    ] {
        registry.register(EVENT_FAMILY, kind.as_u8(), format!("{:?}", kind), shape);
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode, Record, Tagged, Value};

    #[test]
    fn test_registry_contents() {
        let registry = default_registry();
        assert_eq!(registry.resolve(EVENT_FAMILY, 2).unwrap().name, "Breakpoint");
        assert_eq!(registry.tag_of(VALUE_FAMILY, "string"), Some(b's'));
        assert!(registry.variant(EVENT_FAMILY, EventKind::UserDefined.as_u8()).is_none());
    }

    #[test]
    fn test_location_width() {
        assert_eq!(location().fixed_width(), Some(25));
    }

    #[test]
    fn test_decode_line_table() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i64.to_be_bytes());
        bytes.extend_from_slice(&20i64.to_be_bytes());
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(&0i64.to_be_bytes());
        bytes.extend_from_slice(&10i32.to_be_bytes());
        bytes.extend_from_slice(&8i64.to_be_bytes());
        bytes.extend_from_slice(&11i32.to_be_bytes());

        let value = decode(&bytes, &line_table(), &default_registry()).unwrap();
        let entries = value.get("entries").and_then(Value::as_sequence).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].get("lineCodeIndex"), Some(&Value::I64(8)));
        assert_eq!(entries[1].get("lineNumber"), Some(&Value::I32(11)));
    }

    #[test]
    fn test_thread_start_round_trip() {
        let registry = default_registry();
        let value = Value::Record(
            Record::new()
                .with("suspendPolicy", 0u8)
                .with("eventCount", 1i32)
                .with(
                    "events",
                    vec![Value::from(Tagged::new(
                        EventKind::ThreadStart.as_u8(),
                        "ThreadStart",
                        Record::new().with("requestId", 4i32).with("thread", 77u64),
                    ))],
                ),
        );

        let bytes = encode(&value, &composite(), &registry).unwrap();
        assert_eq!(bytes.len(), 1 + 4 + 1 + 4 + 8);
        assert_eq!(decode(&bytes, &composite(), &registry).unwrap(), value);
    }
}
