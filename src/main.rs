use mimalloc::MiMalloc;
use std::error::Error;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use bus::{Bus, RenderCommand, RenderEvent};
use core_types::{ContainerId, RequestId};
use runtime_render::{RuntimeConfig, start_render_runtime};
use vdom::{BuildError, Element, create_element};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn page(text: &str, with_b: bool) -> Result<Element, BuildError> {
    let a = create_element("a", [] as [(&str, &str); 0], [text])?;
    let mut children = vec![a];
    if with_b {
        children.push(Element::builder("b").build()?);
    }
    create_element("div", [("id", "foo")], children)
}

/// Wait for the answer to `request_id`, printing it.
fn await_reply(
    evt_rx: &Receiver<RenderEvent>,
    request_id: RequestId,
) -> Result<(), Box<dyn Error>> {
    loop {
        match evt_rx.recv_timeout(EVENT_TIMEOUT)? {
            RenderEvent::Committed {
                request_id: got,
                version,
                work_units,
                placements,
                updates,
                deletions,
                ..
            } if got == request_id => {
                println!(
                    "v{}: {work_units} units, {placements} placed, {updates} updated, {deletions} deleted",
                    version.0
                );
                return Ok(());
            }
            RenderEvent::Snapshot {
                request_id: got,
                lines,
                ..
            } if got == request_id => {
                for line in lines {
                    println!("  {line}");
                }
                return Ok(());
            }
            RenderEvent::RenderFailed {
                request_id: got,
                error,
                ..
            } if got == request_id => return Err(error.into()),
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let Bus {
        cmd_tx,
        cmd_rx,
        evt_tx,
        evt_rx,
    } = Bus::new();
    let runtime = start_render_runtime(RuntimeConfig::default(), cmd_rx, evt_tx);

    let container_id = ContainerId(1);
    cmd_tx.send(RenderCommand::CreateContainer { container_id })?;

    let steps = [page("bar", true)?, page("baz", true)?, page("baz", false)?];
    let mut request_id: RequestId = 0;
    for element in steps {
        request_id += 1;
        cmd_tx.send(RenderCommand::Render {
            container_id,
            request_id,
            element,
        })?;
        await_reply(&evt_rx, request_id)?;

        request_id += 1;
        cmd_tx.send(RenderCommand::Snapshot {
            container_id,
            request_id,
        })?;
        await_reply(&evt_rx, request_id)?;
    }

    cmd_tx.send(RenderCommand::Shutdown)?;
    runtime.join().map_err(|_| "render runtime panicked")?;
    Ok(())
}
