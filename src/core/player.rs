/// Main player: loads the widget file, then renders and outputs a frame per tick.
use anyhow::{Context, Result};
use chrono::Local;
use std::io::Write;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{self, OutputMode, PlayerConfig};
use crate::render::engine::RenderEngine;
use crate::render::text::FontBook;

pub struct Player {
    config: PlayerConfig,
    engine: RenderEngine,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let fonts = match &config.font {
            Some(regular) => FontBook::load(regular, config.bold_font.as_deref())
                .context("Failed to load fonts")?,
            None => FontBook::builtin().context("Failed to load builtin fonts")?,
        };
        let scene = config::load_scene(&config)?;
        let engine = RenderEngine::new(scene, fonts)?;
        Ok(Self { config, engine })
    }

    /// Render loop. Returns after one frame in `once` mode, otherwise on Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames_rendered: u64 = 0;

        info!(
            "Starting render loop: {}x{} every {:?}, output: {:?}",
            self.engine.width(),
            self.engine.height(),
            self.config.interval,
            self.config.output_mode
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.render_once(frames_rendered).await?;
                    frames_rendered += 1;
                    if self.config.once {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted after {} frame(s)", frames_rendered);
                    break;
                }
            }
        }

        Ok(())
    }

    async fn render_once(&mut self, frame: u64) -> Result<()> {
        self.engine.refresh().await;
        let now = Local::now().fixed_offset();
        self.engine
            .render_frame(&now)
            .with_context(|| format!("Failed to render frame {frame}"))?;

        match self.config.output_mode {
            OutputMode::Png => {
                let output_path = &self.config.output_path;
                self.engine
                    .save_png(output_path)
                    .context("Failed to save PNG output")?;
                debug!("Saved frame {} to {}", frame, output_path.display());
            }
            OutputMode::Raw => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(self.engine.pixels())
                    .and_then(|_| stdout.flush())
                    .context("Failed to write raw frame to stdout")?;
            }
        }
        Ok(())
    }
}
