// SPDX-License-Identifier: GPL-3.0-only

//! Session driver
//!
//! Performs the [`Task`]s a session returns on a tokio runtime and feeds the
//! completions back as messages. Mutation stays on the caller's thread: the
//! spawned tasks only perform HTTP and hand back a [`Message`].

use crate::app::state::{Message, Task};
use crate::app::{SessionModel, SessionSettings};
use crate::backends::camera::get_backend_for_type;
use crate::config::Config;
use crate::errors::AppResult;
use crate::remote::{CompileClient, Downloader, ProcessingClient, ServerClient};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Performs session I/O
#[derive(Debug, Clone)]
pub struct Executor {
    processing: ProcessingClient,
    compiler: CompileClient,
    downloader: Downloader,
}

impl Executor {
    pub fn new(server: ServerClient, downloader: Downloader) -> Self {
        Self {
            processing: ProcessingClient::new(server.clone()),
            compiler: CompileClient::new(server),
            downloader,
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let server = ServerClient::new(&config.server_url, config.request_timeout())?;
        let downloader = Downloader::new(
            server.clone(),
            config.download_action,
            config.download_dir.clone(),
        );
        Ok(Self::new(server, downloader))
    }

    /// Run one task to completion
    pub async fn run(&self, task: Task) -> Option<Message> {
        match task {
            Task::None => None,
            Task::Process(job) => Some(Message::Processed {
                token: job.token,
                result: self.processing.submit(&job.frame).await,
            }),
            Task::Compile(job) => Some(Message::Compiled {
                token: job.token,
                result: self.compiler.compile(job.filenames).await,
            }),
            Task::Download(url) => Some(Message::Downloaded(self.downloader.download(&url).await)),
        }
    }
}

/// A session plus the machinery that performs its tasks
pub struct SessionRuntime {
    model: SessionModel,
    executor: Arc<Executor>,
    handle: Handle,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    pending: usize,
}

impl SessionRuntime {
    pub fn new(model: SessionModel, executor: Executor, handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            model,
            executor: Arc::new(executor),
            handle,
            tx,
            rx,
            pending: 0,
        }
    }

    /// Build the backend, session and executor described by `config`
    pub fn from_config(config: &Config, handle: Handle) -> AppResult<Self> {
        let backend = get_backend_for_type(config.backend, &config.still_images)?;
        let model = SessionModel::new(backend, SessionSettings::from_config(config)?);
        Ok(Self::new(model, Executor::from_config(config)?, handle))
    }

    pub fn model(&self) -> &SessionModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut SessionModel {
        &mut self.model
    }

    /// Tasks spawned and not yet fed back
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Apply a message and start whatever I/O it asks for
    pub fn dispatch(&mut self, message: Message) {
        let task = self.model.update(message);
        if task.is_none() {
            return;
        }

        debug!(?task, "Spawning task");
        self.pending += 1;
        let executor = Arc::clone(&self.executor);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            if let Some(message) = executor.run(task).await {
                if tx.send(message).is_err() {
                    warn!("Session closed before task completed");
                }
            }
        });
    }

    /// Apply every completion that has already arrived, without waiting
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.complete(message);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns false when nothing is outstanding.
    pub async fn next_completion(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(message) => {
                self.complete(message);
                true
            }
            None => false,
        }
    }

    /// Wait until no task is outstanding, including follow-up tasks
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn complete(&mut self, message: Message) {
        self.pending = self.pending.saturating_sub(1);
        self.dispatch(message);
    }
}
