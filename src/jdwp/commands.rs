//! Typed wrappers for the commands a debugger front end needs most.
//!
//! Each wrapper builds its payload with [`Seq`], calls through the session
//! and decodes the reply with a shape from [`schema`](super::schema).

use crate::codec::{CodecError, Seq, Tagged, Value};
use crate::error::Result;
use crate::protocol::Event;
use crate::session::Session;

use super::types::{EventKind, EventRequestSet, Location, Tag};
use super::{
    command_set, event, event_request, method, object_reference, reference_type, schema,
    stack_frame, string_reference, thread_reference, virtual_machine,
};

/// A loaded reference type, as reported by `ClassesBySignature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRef {
    pub type_tag: u8,
    pub class_id: u64,
    pub status: i32,
}

/// A method declared by a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub class_id: u64,
    pub method_id: u64,
    pub name: String,
    pub signature: String,
    pub mod_bits: i32,
}

/// A stack frame of a suspended thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef {
    pub thread: u64,
    pub frame_id: u64,
    pub location: Location,
}

type Decoded<T> = std::result::Result<T, CodecError>;

fn missing(name: &str) -> CodecError {
    CodecError::MissingField(name.to_string())
}

fn get<'a>(value: &'a Value, name: &str) -> Decoded<&'a Value> {
    value.get(name).ok_or_else(|| missing(name))
}

fn get_str(value: &Value, name: &str) -> Decoded<String> {
    get(value, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| missing(name))
}

fn get_u64(value: &Value, name: &str) -> Decoded<u64> {
    get(value, name)?.as_u64().ok_or_else(|| missing(name))
}

fn get_i32(value: &Value, name: &str) -> Decoded<i32> {
    get(value, name)?.as_i32().ok_or_else(|| missing(name))
}

fn items<'a>(value: &'a Value, name: &str) -> Decoded<&'a [Value]> {
    get(value, name)?.as_sequence().ok_or_else(|| missing(name))
}

impl Session {
    /// Decode an `Event.Composite` body.
    ///
    /// Returns `None` for frames from any other command set or command.
    pub fn decode_composite(&self, frame: &Event) -> Option<Result<Value>> {
        if frame.command_set != command_set::EVENT || frame.command != event::COMPOSITE {
            return None;
        }
        Some(self.decode(&frame.data, &schema::composite()))
    }

    /// `VirtualMachine.Version`.
    pub async fn vm_version(&self) -> Result<Value> {
        self.call_decode(
            command_set::VIRTUAL_MACHINE,
            virtual_machine::VERSION,
            &[],
            &schema::version(),
        )
        .await
    }

    /// `VirtualMachine.IDSizes`.
    pub async fn id_sizes(&self) -> Result<Value> {
        self.call_decode(
            command_set::VIRTUAL_MACHINE,
            virtual_machine::ID_SIZES,
            &[],
            &schema::id_sizes(),
        )
        .await
    }

    /// `VirtualMachine.ClassesBySignature`, e.g. `Ljava/lang/String;`.
    pub async fn classes_by_signature(&self, signature: &str) -> Result<Vec<ClassRef>> {
        let payload = Seq::new().string(signature).marshal()?;
        let value = self
            .call_decode(
                command_set::VIRTUAL_MACHINE,
                virtual_machine::CLASSES_BY_SIGNATURE,
                &payload,
                &schema::classes_by_signature(),
            )
            .await?;

        let classes = items(&value, "details")?
            .iter()
            .map(|d| -> Decoded<ClassRef> {
                Ok(ClassRef {
                    type_tag: get(d, "refTypeTag")?.as_u8().ok_or_else(|| missing("refTypeTag"))?,
                    class_id: get_u64(d, "typeID")?,
                    status: get_i32(d, "status")?,
                })
            })
            .collect::<Decoded<Vec<_>>>()?;
        Ok(classes)
    }

    /// `VirtualMachine.AllThreads`.
    pub async fn all_threads(&self) -> Result<Vec<u64>> {
        let value = self
            .call_decode(
                command_set::VIRTUAL_MACHINE,
                virtual_machine::ALL_THREADS,
                &[],
                &schema::all_threads(),
            )
            .await?;
        Ok(items(&value, "ids")?.iter().filter_map(Value::as_u64).collect())
    }

    /// `VirtualMachine.Suspend`.
    pub async fn suspend_vm(&self) -> Result<()> {
        self.call_checked(command_set::VIRTUAL_MACHINE, virtual_machine::SUSPEND, &[])
            .await
            .map(drop)
    }

    /// `VirtualMachine.Resume`.
    pub async fn resume_vm(&self) -> Result<()> {
        self.call_checked(command_set::VIRTUAL_MACHINE, virtual_machine::RESUME, &[])
            .await
            .map(drop)
    }

    /// `VirtualMachine.Dispose`: detach, leaving the VM running.
    pub async fn dispose_vm(&self) -> Result<()> {
        self.call_checked(command_set::VIRTUAL_MACHINE, virtual_machine::DISPOSE, &[])
            .await
            .map(drop)
    }

    /// `ReferenceType.Signature`.
    pub async fn class_signature(&self, class_id: u64) -> Result<String> {
        let payload = Seq::new().u64(class_id).marshal()?;
        let value = self
            .call_decode(
                command_set::REFERENCE_TYPE,
                reference_type::SIGNATURE,
                &payload,
                &schema::signature(),
            )
            .await?;
        Ok(get_str(&value, "signature")?)
    }

    /// `ReferenceType.Methods`.
    pub async fn methods(&self, class_id: u64) -> Result<Vec<MethodRef>> {
        let payload = Seq::new().u64(class_id).marshal()?;
        let value = self
            .call_decode(
                command_set::REFERENCE_TYPE,
                reference_type::METHODS,
                &payload,
                &schema::methods(),
            )
            .await?;

        let methods = items(&value, "methods")?
            .iter()
            .map(|m| -> Decoded<MethodRef> {
                Ok(MethodRef {
                    class_id,
                    method_id: get_u64(m, "methodID")?,
                    name: get_str(m, "name")?,
                    signature: get_str(m, "signature")?,
                    mod_bits: get_i32(m, "modBits")?,
                })
            })
            .collect::<Decoded<Vec<_>>>()?;
        Ok(methods)
    }

    /// `ReferenceType.Fields`, as the decoded `{declared, fields}` record.
    pub async fn fields(&self, class_id: u64) -> Result<Value> {
        let payload = Seq::new().u64(class_id).marshal()?;
        self.call_decode(
            command_set::REFERENCE_TYPE,
            reference_type::FIELDS,
            &payload,
            &schema::fields(),
        )
        .await
    }

    /// `ObjectReference.ReferenceType`: the runtime type of an object.
    pub async fn object_type(&self, object_id: u64) -> Result<(u8, u64)> {
        let payload = Seq::new().u64(object_id).marshal()?;
        let value = self
            .call_decode(
                command_set::OBJECT_REFERENCE,
                object_reference::REFERENCE_TYPE,
                &payload,
                &schema::reference_type(),
            )
            .await?;
        let tag = get(&value, "refTypeTag")?
            .as_u8()
            .ok_or_else(|| missing("refTypeTag"))?;
        Ok((tag, get_u64(&value, "typeID")?))
    }

    /// `Method.LineTable`.
    pub async fn line_table(&self, method_ref: &MethodRef) -> Result<Value> {
        let payload = Seq::new()
            .u64(method_ref.class_id)
            .u64(method_ref.method_id)
            .marshal()?;
        self.call_decode(
            command_set::METHOD,
            method::LINE_TABLE,
            &payload,
            &schema::line_table(),
        )
        .await
    }

    /// `Method.VariableTable`.
    pub async fn variable_table(&self, method_ref: &MethodRef) -> Result<Value> {
        let payload = Seq::new()
            .u64(method_ref.class_id)
            .u64(method_ref.method_id)
            .marshal()?;
        self.call_decode(
            command_set::METHOD,
            method::VARIABLE_TABLE,
            &payload,
            &schema::variable_table(),
        )
        .await
    }

    /// `ThreadReference.Name`.
    pub async fn thread_name(&self, thread: u64) -> Result<String> {
        let payload = Seq::new().u64(thread).marshal()?;
        let value = self
            .call_decode(
                command_set::THREAD_REFERENCE,
                thread_reference::NAME,
                &payload,
                &schema::thread_name(),
            )
            .await?;
        Ok(get_str(&value, "threadName")?)
    }

    /// `ThreadReference.Resume`.
    pub async fn resume_thread(&self, thread: u64) -> Result<()> {
        let payload = Seq::new().u64(thread).marshal()?;
        self.call_checked(command_set::THREAD_REFERENCE, thread_reference::RESUME, &payload)
            .await
            .map(drop)
    }

    /// `ThreadReference.Frames`; `length` of -1 means all remaining frames.
    pub async fn thread_frames(&self, thread: u64, start: i32, length: i32) -> Result<Vec<FrameRef>> {
        let payload = Seq::new().u64(thread).int(start).int(length).marshal()?;
        let value = self
            .call_decode(
                command_set::THREAD_REFERENCE,
                thread_reference::FRAMES,
                &payload,
                &schema::frames(),
            )
            .await?;

        let frames = items(&value, "items")?
            .iter()
            .map(|f| -> Decoded<FrameRef> {
                Ok(FrameRef {
                    thread,
                    frame_id: get_u64(f, "frameID")?,
                    location: Location::from_value(get(f, "location")?)
                        .ok_or_else(|| missing("location"))?,
                })
            })
            .collect::<Decoded<Vec<_>>>()?;
        Ok(frames)
    }

    /// `StackFrame.GetValues` for `(slot, tag)` pairs, in request order.
    pub async fn frame_values(&self, frame: &FrameRef, slots: &[(i32, Tag)]) -> Result<Vec<Tagged>> {
        let mut seq = Seq::new();
        seq.u64(frame.thread)
            .u64(frame.frame_id)
            .count(slots.len());
        for (slot, tag) in slots {
            seq.int(*slot).octet(tag.as_u8());
        }
        let payload = seq.marshal()?;

        let value = self
            .call_decode(
                command_set::STACK_FRAME,
                stack_frame::GET_VALUES,
                &payload,
                &schema::get_values(),
            )
            .await?;
        Ok(items(&value, "items")?
            .iter()
            .filter_map(Value::as_tagged)
            .cloned()
            .collect())
    }

    /// `StringReference.Value`.
    pub async fn string_value(&self, string_id: u64) -> Result<String> {
        let payload = Seq::new().u64(string_id).marshal()?;
        let value = self
            .call_decode(
                command_set::STRING_REFERENCE,
                string_reference::VALUE,
                &payload,
                &schema::string_value(),
            )
            .await?;
        Ok(get_str(&value, "stringValue")?)
    }

    /// `EventRequest.Set`; returns the request id the VM assigned.
    pub async fn set_event_request(&self, request: &EventRequestSet) -> Result<i32> {
        let payload = Seq::new().write(request).marshal()?;
        let value = self
            .call_decode(
                command_set::EVENT_REQUEST,
                event_request::SET,
                &payload,
                &schema::event_request_set(),
            )
            .await?;
        Ok(get_i32(&value, "requestID")?)
    }

    /// `EventRequest.Clear`.
    pub async fn clear_event_request(&self, kind: EventKind, request_id: i32) -> Result<()> {
        let payload = Seq::new().octet(kind.as_u8()).int(request_id).marshal()?;
        self.call_checked(command_set::EVENT_REQUEST, event_request::CLEAR, &payload)
            .await
            .map(drop)
    }

    /// `EventRequest.ClearAllBreakpoints`.
    pub async fn clear_all_breakpoints(&self) -> Result<()> {
        self.call_checked(
            command_set::EVENT_REQUEST,
            event_request::CLEAR_ALL_BREAKPOINTS,
            &[],
        )
        .await
        .map(drop)
    }
}
