use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bus::{RenderCommand, RenderEvent};
use core_types::{ContainerId, RenderVersion, RequestId};
use dom::{Dom, NodeKey};
use fiber::{Deadline, EngineConfig, InFlightPolicy, Renderer, Tick};
use vdom::Element;

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Time granted to each busy renderer per scheduling round.
    pub slice: Duration,
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            slice: Duration::from_millis(5),
            engine: EngineConfig::default(),
        }
    }
}

struct Target {
    container: NodeKey,
    renderer: Renderer<NodeKey>,
    version: RenderVersion,
    in_flight: Option<RequestId>,
    queued: Option<RequestId>,
}

impl Target {
    /// Hand the request to the renderer. Returns the request it displaced,
    /// which will never commit.
    fn schedule(&mut self, request_id: RequestId, element: Element) -> Option<RequestId> {
        let busy = !self.renderer.is_idle();
        self.renderer.render(element, self.container);
        match (busy, self.renderer.config().in_flight) {
            (true, InFlightPolicy::Queue) => self.queued.replace(request_id),
            _ => self.in_flight.replace(request_id),
        }
    }

    /// The renderer moves on to its queued request by itself; keep the ids in
    /// step with it.
    fn advance(&mut self) -> Option<RequestId> {
        let finished = self.in_flight.take();
        self.in_flight = self.queued.take();
        finished
    }
}

struct RenderRuntime {
    config: RuntimeConfig,
    dom: Dom,
    targets: BTreeMap<ContainerId, Target>,
    evt_tx: Sender<RenderEvent>,
}

enum Flow {
    Continue,
    Stop,
}

/// Spawn the runtime thread. It owns the display tree and one renderer per
/// container, and acts as the host scheduler for all of them: while any
/// renderer has work it grants each a `slice` per round and only polls for
/// commands in between; when everything is idle it blocks on `cmd_rx`.
///
/// The thread exits on `Shutdown` or when every command sender is dropped.
pub fn start_render_runtime(
    config: RuntimeConfig,
    cmd_rx: Receiver<RenderCommand>,
    evt_tx: Sender<RenderEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut runtime = RenderRuntime {
            config,
            dom: Dom::new(),
            targets: BTreeMap::new(),
            evt_tx,
        };
        runtime.run(&cmd_rx);
        log::debug!(target: "runtime.render", "render runtime stopped");
    })
}

impl RenderRuntime {
    fn run(&mut self, cmd_rx: &Receiver<RenderCommand>) {
        loop {
            let cmd = if self.is_busy() {
                match cmd_rx.try_recv() {
                    Ok(cmd) => Some(cmd),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => return,
                }
            } else {
                match cmd_rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => return,
                }
            };

            match cmd {
                Some(cmd) => {
                    if let Flow::Stop = self.handle(cmd) {
                        return;
                    }
                }
                None => self.grant_slices(),
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.targets.values().any(|t| !t.renderer.is_idle())
    }

    fn handle(&mut self, cmd: RenderCommand) -> Flow {
        match cmd {
            RenderCommand::CreateContainer { container_id } => {
                if !self.targets.contains_key(&container_id) {
                    let container = self.dom.create_container();
                    self.targets.insert(
                        container_id,
                        Target {
                            container,
                            renderer: Renderer::new(self.config.engine.clone()),
                            version: RenderVersion::INITIAL,
                            in_flight: None,
                            queued: None,
                        },
                    );
                }
                let _ = self.evt_tx.send(RenderEvent::ContainerReady { container_id });
            }
            RenderCommand::Render {
                container_id,
                request_id,
                element,
            } => match self.targets.get_mut(&container_id) {
                Some(target) => {
                    log::debug!(
                        target: "runtime.render",
                        "render request {request_id} for {container_id:?}"
                    );
                    if let Some(superseded) = target.schedule(request_id, element) {
                        log::debug!(
                            target: "runtime.render",
                            "request {superseded} superseded by {request_id}"
                        );
                        let _ = self.evt_tx.send(RenderEvent::RenderFailed {
                            container_id,
                            request_id: superseded,
                            error: format!("superseded by request {request_id}"),
                        });
                    }
                }
                None => self.unknown(container_id, request_id),
            },
            RenderCommand::Snapshot {
                container_id,
                request_id,
            } => {
                let Some(target) = self.targets.get(&container_id) else {
                    self.unknown(container_id, request_id);
                    return Flow::Continue;
                };
                let event = match self.dom.snapshot(target.container) {
                    Ok(snapshot) => RenderEvent::Snapshot {
                        container_id,
                        request_id,
                        version: target.version,
                        lines: snapshot.as_lines().to_vec(),
                    },
                    Err(err) => RenderEvent::RenderFailed {
                        container_id,
                        request_id,
                        error: err.to_string(),
                    },
                };
                let _ = self.evt_tx.send(event);
            }
            RenderCommand::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    fn unknown(&self, container_id: ContainerId, request_id: RequestId) {
        log::warn!(target: "runtime.render", "unknown container {container_id:?}");
        let _ = self.evt_tx.send(RenderEvent::RenderFailed {
            container_id,
            request_id,
            error: format!("unknown container {}", container_id.0),
        });
    }

    fn grant_slices(&mut self) {
        for (&container_id, target) in self.targets.iter_mut() {
            if target.renderer.is_idle() {
                continue;
            }
            let mut deadline = Deadline::after(self.config.slice);
            match target.renderer.tick(&mut self.dom, &mut deadline) {
                Ok(Tick::Committed { .. }) => {
                    target.version = target.version.next();
                    let request_id = target.advance().unwrap_or_default();
                    let report = target.renderer.last_commit();
                    let _ = self.evt_tx.send(RenderEvent::Committed {
                        container_id,
                        request_id,
                        version: target.version,
                        work_units: report.map_or(0, |r| r.work_units),
                        placements: report.map_or(0, |r| r.placements),
                        updates: report.map_or(0, |r| r.updates),
                        deletions: report.map_or(0, |r| r.deletions),
                    });
                }
                Ok(Tick::Yielded { units }) => {
                    log::trace!(target: "runtime.render", "{container_id:?} yielded after {units} units");
                }
                Ok(Tick::Idle) => {}
                Err(err) => {
                    let request_id = target.advance().unwrap_or_default();
                    let _ = self.evt_tx.send(RenderEvent::RenderFailed {
                        container_id,
                        request_id,
                        error: err.to_string(),
                    });
                }
            }
        }
        // Discarded builds and failed commits leave detached handles behind;
        // they can only be told apart from live work once nothing is in flight.
        if !self.is_busy() {
            self.dom.sweep_detached();
        }
    }
}
