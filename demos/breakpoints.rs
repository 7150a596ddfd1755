//! Set a breakpoint on the first instruction of a method and report hits.
//!
//! ```text
//! cargo run --example breakpoints -- 127.0.0.1:5005 Lcom/example/Main; main
//! ```

use jdwp_client::codec::Value;
use jdwp_client::jdwp::{EventKind, EventRequestSet, Location, SuspendPolicy};
use jdwp_client::Session;

const MAX_HITS: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:5005".to_string());
    let signature = args.next().ok_or("missing class signature")?;
    let method_name = args.next().unwrap_or_else(|| "main".to_string());

    let session = Session::dial(&addr).await?;
    let mut events = session.events()?;

    let class = session
        .classes_by_signature(&signature)
        .await?
        .into_iter()
        .next()
        .ok_or("class not loaded")?;
    let method = session
        .methods(class.class_id)
        .await?
        .into_iter()
        .find(|m| m.name == method_name)
        .ok_or("method not found")?;

    let request = EventRequestSet::new(EventKind::Breakpoint, SuspendPolicy::EventThread)
        .location_only(Location::in_class(class.class_id, method.method_id, 0));
    let request_id = session.set_event_request(&request).await?;
    tracing::info!("Breakpoint request {} on {}.{}", request_id, signature, method_name);

    session.resume_vm().await?;

    let mut hits = 0;
    while let Some(event) = events.recv().await {
        let Some(body) = session.decode_composite(&event) else {
            continue;
        };
        let body = body?;
        let list = body.get("events").and_then(Value::as_sequence).unwrap_or(&[]);

        for item in list.iter().filter_map(Value::as_tagged) {
            match EventKind::from_u8(item.tag) {
                Some(EventKind::Breakpoint) => {
                    let thread = item.value.get("thread").and_then(Value::as_u64).unwrap_or(0);
                    let name = session.thread_name(thread).await?;
                    let frames = session.thread_frames(thread, 0, -1).await?;
                    println!("hit in {} ({} frames)", name, frames.len());
                    hits += 1;
                    session.resume_thread(thread).await?;
                }
                Some(EventKind::VmDeath) => {
                    tracing::info!("VM exited");
                    return Ok(());
                }
                _ => println!("{}", serde_json::to_string(item)?),
            }
        }

        if hits >= MAX_HITS {
            break;
        }
    }

    session
        .clear_event_request(EventKind::Breakpoint, request_id)
        .await?;
    session.dispose_vm().await?;
    session.close().await?;
    Ok(())
}
