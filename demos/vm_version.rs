//! Print the target VM's version, id sizes and thread names.
//!
//! Start a JVM with
//! `-agentlib:jdwp=transport=dt_socket,server=y,suspend=y,address=5005`, then:
//!
//! ```text
//! cargo run --example vm_version -- 127.0.0.1:5005 [config.json]
//! ```

use jdwp_client::{Session, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:5005".to_string());
    let config = match args.next() {
        Some(path) => SessionConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };

    let session = Session::builder().config(config).dial(&addr).await?;
    tracing::info!("Connected to {}", addr);

    let version = session.vm_version().await?;
    println!("{}", serde_json::to_string_pretty(&version)?);

    let sizes = session.id_sizes().await?;
    println!("{}", serde_json::to_string_pretty(&sizes)?);

    for thread in session.all_threads().await? {
        match session.thread_name(thread).await {
            Ok(name) => println!("thread {:#x}: {}", thread, name),
            Err(e) => tracing::warn!("Thread {:#x} vanished: {}", thread, e),
        }
    }

    session.dispose_vm().await?;
    session.close().await?;
    Ok(())
}
