use crate::codec::{Seq, Value, Writable};

macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),*
        }

        impl $name {
            /// Wire value.
            #[inline]
            pub fn as_u8(self) -> u8 {
                self as u8
            }

            /// Parse a wire value.
            pub fn from_u8(v: u8) -> Option<Self> {
                match v {
                    $(x if x == $value => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl From<$name> for u8 {
            fn from(v: $name) -> u8 {
                v as u8
            }
        }
    };
}

byte_enum! {
    /// Kind of reference type.
    pub enum TypeTag {
        Class = 1,
        Interface = 2,
        Array = 3,
    }
}

byte_enum! {
    /// Discriminant of a tagged value.
    pub enum Tag {
        Array = b'[',
        Byte = b'B',
        Char = b'C',
        Object = b'L',
        Float = b'F',
        Double = b'D',
        Int = b'I',
        Long = b'J',
        Short = b'S',
        Void = b'V',
        Boolean = b'Z',
        String = b's',
        Thread = b't',
        ThreadGroup = b'g',
        ClassLoader = b'l',
        ClassObject = b'c',
    }
}

impl Tag {
    /// Tag for a JNI type signature such as `I` or `Ljava/lang/String;`.
    pub fn for_signature(signature: &str) -> Option<Tag> {
        signature.bytes().next().and_then(Tag::from_u8)
    }
}

byte_enum! {
    /// Event kinds, used both in requests and in composite events.
    pub enum EventKind {
        SingleStep = 1,
        Breakpoint = 2,
        FramePop = 3,
        Exception = 4,
        UserDefined = 5,
        ThreadStart = 6,
        ThreadDeath = 7,
        ClassPrepare = 8,
        ClassUnload = 9,
        ClassLoad = 10,
        FieldAccess = 20,
        FieldModification = 21,
        ExceptionCatch = 30,
        MethodEntry = 40,
        MethodExit = 41,
        MethodExitWithReturnValue = 42,
        MonitorContendedEnter = 43,
        MonitorContendedEntered = 44,
        MonitorWait = 45,
        MonitorWaited = 46,
        VmStart = 90,
        VmDeath = 99,
    }
}

byte_enum! {
    /// Which threads the VM suspends when an event fires.
    pub enum SuspendPolicy {
        None = 0,
        EventThread = 1,
        All = 2,
    }
}

byte_enum! {
    /// Event request modifier kinds.
    pub enum ModKind {
        Count = 1,
        Conditional = 2,
        ThreadOnly = 3,
        ClassOnly = 4,
        ClassMatch = 5,
        ClassExclude = 6,
        LocationOnly = 7,
        ExceptionOnly = 8,
        FieldOnly = 9,
        Step = 10,
        InstanceOnly = 11,
        SourceNameMatch = 12,
    }
}

byte_enum! {
    pub enum StepSize {
        Min = 0,
        Line = 1,
    }
}

byte_enum! {
    pub enum StepDepth {
        Into = 0,
        Over = 1,
        Out = 2,
    }
}

/// An executable position: class, method and bytecode index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub type_tag: u8,
    pub class_id: u64,
    pub method_id: u64,
    pub index: u64,
}

impl Location {
    /// Location inside a class (the common case for breakpoints).
    pub fn in_class(class_id: u64, method_id: u64, index: u64) -> Self {
        Self {
            type_tag: TypeTag::Class.as_u8(),
            class_id,
            method_id,
            index,
        }
    }

    /// Read a location out of a decoded [`schema::location`](super::schema::location) record.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            type_tag: value.get("typeTag")?.as_u8()?,
            class_id: value.get("classId")?.as_u64()?,
            method_id: value.get("methodId")?.as_u64()?,
            index: value.get("index")?.as_u64()?,
        })
    }
}

impl Writable for Location {
    fn write_to(&self, seq: &mut Seq) {
        seq.octet(self.type_tag)
            .u64(self.class_id)
            .u64(self.method_id)
            .u64(self.index);
    }
}

/// One filter attached to an event request.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Count(i32),
    Conditional(i32),
    ThreadOnly(u64),
    ClassOnly(u64),
    ClassMatch(String),
    ClassExclude(String),
    LocationOnly(Location),
    ExceptionOnly {
        exception_or_null: u64,
        caught: bool,
        uncaught: bool,
    },
    FieldOnly {
        declaring: u64,
        field_id: u64,
    },
    Step {
        thread: u64,
        size: StepSize,
        depth: StepDepth,
    },
    InstanceOnly(u64),
    SourceNameMatch(String),
}

impl Modifier {
    pub fn kind(&self) -> ModKind {
        match self {
            Modifier::Count(_) => ModKind::Count,
            Modifier::Conditional(_) => ModKind::Conditional,
            Modifier::ThreadOnly(_) => ModKind::ThreadOnly,
            Modifier::ClassOnly(_) => ModKind::ClassOnly,
            Modifier::ClassMatch(_) => ModKind::ClassMatch,
            Modifier::ClassExclude(_) => ModKind::ClassExclude,
            Modifier::LocationOnly(_) => ModKind::LocationOnly,
            Modifier::ExceptionOnly { .. } => ModKind::ExceptionOnly,
            Modifier::FieldOnly { .. } => ModKind::FieldOnly,
            Modifier::Step { .. } => ModKind::Step,
            Modifier::InstanceOnly(_) => ModKind::InstanceOnly,
            Modifier::SourceNameMatch(_) => ModKind::SourceNameMatch,
        }
    }
}

impl Writable for Modifier {
    fn write_to(&self, seq: &mut Seq) {
        seq.octet(self.kind().as_u8());
        match self {
            Modifier::Count(n) | Modifier::Conditional(n) => {
                seq.int(*n);
            }
            Modifier::ThreadOnly(id) | Modifier::ClassOnly(id) | Modifier::InstanceOnly(id) => {
                seq.u64(*id);
            }
            Modifier::ClassMatch(p) | Modifier::ClassExclude(p) | Modifier::SourceNameMatch(p) => {
                seq.string(p);
            }
            Modifier::LocationOnly(location) => {
                seq.write(location);
            }
            Modifier::ExceptionOnly {
                exception_or_null,
                caught,
                uncaught,
            } => {
                seq.u64(*exception_or_null)
                    .boolean(*caught)
                    .boolean(*uncaught);
            }
            Modifier::FieldOnly { declaring, field_id } => {
                seq.u64(*declaring).u64(*field_id);
            }
            Modifier::Step {
                thread,
                size,
                depth,
            } => {
                seq.u64(*thread)
                    .int(size.as_u8() as i32)
                    .int(depth.as_u8() as i32);
            }
        }
    }
}

/// Payload for `EventRequest.Set`.
///
/// # Example
///
/// ```
/// use jdwp_client::codec::Seq;
/// use jdwp_client::jdwp::{EventKind, EventRequestSet, Location, SuspendPolicy};
///
/// let request = EventRequestSet::new(EventKind::Breakpoint, SuspendPolicy::EventThread)
///     .location_only(Location::in_class(2, 3, 0))
///     .count(1);
///
/// let mut seq = Seq::new();
/// seq.write(&request);
/// let payload = seq.marshal().unwrap();
/// assert_eq!(&payload[..6], &[2, 1, 0, 0, 0, 2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EventRequestSet {
    pub kind: EventKind,
    pub suspend_policy: SuspendPolicy,
    pub modifiers: Vec<Modifier>,
}

impl EventRequestSet {
    pub fn new(kind: EventKind, suspend_policy: SuspendPolicy) -> Self {
        Self {
            kind,
            suspend_policy,
            modifiers: Vec::new(),
        }
    }

    /// Append a modifier. Modifiers are applied by the VM in order.
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Report only the first `n` occurrences.
    pub fn count(self, n: i32) -> Self {
        self.modifier(Modifier::Count(n))
    }

    pub fn thread_only(self, thread: u64) -> Self {
        self.modifier(Modifier::ThreadOnly(thread))
    }

    pub fn class_only(self, class_id: u64) -> Self {
        self.modifier(Modifier::ClassOnly(class_id))
    }

    /// Class name pattern; may start or end with `*`.
    pub fn class_match(self, pattern: impl Into<String>) -> Self {
        self.modifier(Modifier::ClassMatch(pattern.into()))
    }

    pub fn class_exclude(self, pattern: impl Into<String>) -> Self {
        self.modifier(Modifier::ClassExclude(pattern.into()))
    }

    pub fn location_only(self, location: Location) -> Self {
        self.modifier(Modifier::LocationOnly(location))
    }

    pub fn step(self, thread: u64, size: StepSize, depth: StepDepth) -> Self {
        self.modifier(Modifier::Step {
            thread,
            size,
            depth,
        })
    }
}

impl Writable for EventRequestSet {
    fn write_to(&self, seq: &mut Seq) {
        seq.octet(self.kind.as_u8())
            .octet(self.suspend_policy.as_u8())
            .count(self.modifiers.len());
        for modifier in &self.modifiers {
            seq.write(modifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Record;

    #[test]
    fn test_byte_enum_round_trip() {
        assert_eq!(EventKind::from_u8(2), Some(EventKind::Breakpoint));
        assert_eq!(EventKind::from_u8(200), None);
        assert_eq!(u8::from(SuspendPolicy::All), 2);
        assert_eq!(Tag::from_u8(b's'), Some(Tag::String));
    }

    #[test]
    fn test_tag_for_signature() {
        assert_eq!(Tag::for_signature("I"), Some(Tag::Int));
        assert_eq!(Tag::for_signature("Ljava/lang/String;"), Some(Tag::Object));
        assert_eq!(Tag::for_signature("[I"), Some(Tag::Array));
        assert_eq!(Tag::for_signature(""), None);
    }

    #[test]
    fn test_location_write() {
        let mut seq = Seq::new();
        seq.write(&Location::in_class(2, 0x7f9475c27c10, 0));
        let bytes = seq.marshal().unwrap();

        assert_eq!(bytes.len(), 25);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[9..17], &0x7f9475c27c10u64.to_be_bytes());
    }

    #[test]
    fn test_location_from_value() {
        let value = Value::Record(
            Record::new()
                .with("typeTag", 1u8)
                .with("classId", 2u64)
                .with("methodId", 3u64)
                .with("index", 4u64),
        );
        assert_eq!(
            Location::from_value(&value),
            Some(Location::in_class(2, 3, 4))
        );
        assert_eq!(Location::from_value(&Value::U8(1)), None);
    }

    #[test]
    fn test_event_request_set_layout() {
        let request = EventRequestSet::new(EventKind::ClassPrepare, SuspendPolicy::All)
            .class_match("com.example.*")
            .count(1);

        let mut seq = Seq::new();
        seq.write(&request);
        let bytes = seq.marshal().unwrap();

        let mut expected = vec![8, 2, 0, 0, 0, 2, 5, 0, 0, 0, 13];
        expected.extend_from_slice(b"com.example.*");
        expected.extend_from_slice(&[1, 0, 0, 0, 1]);
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn test_step_modifier() {
        let mut seq = Seq::new();
        seq.write(&Modifier::Step {
            thread: 9,
            size: StepSize::Line,
            depth: StepDepth::Over,
        });
        let bytes = seq.marshal().unwrap();
        assert_eq!(bytes[0], ModKind::Step.as_u8());
        assert_eq!(&bytes[9..], &[0, 0, 0, 1, 0, 0, 0, 1]);
    }
}
