use anyhow::Result;
use clap::Parser;
use signage_player::config;
use signage_player::feed::HttpFeedClient;
use signage_player::host::ChannelHost;
use signage_player::model::{ExecutionId, Slide};
use signage_player::player::SlidePlayer;
use signage_player::templates::TemplateContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Play the playlist a single time, ignoring `app.loop_playlist`
    #[arg(long)]
    once: bool,
    /// Print the parsed playlist as JSON and exit
    #[arg(long)]
    dump_slides: bool,
}

/// Wait for the host completion of `execution`, skipping late ones.
async fn wait_done(done_rx: &mut UnboundedReceiver<Slide>, execution: &ExecutionId) -> bool {
    while let Some(done) = done_rx.recv().await {
        if &done.execution_id == execution {
            return true;
        }
        debug!(execution = %done.execution_id, "ignoring completion of a previous activation");
    }
    false
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    if args.dump_slides {
        println!("{}", serde_json::to_string_pretty(&cfg.playlist)?);
        return Ok(());
    }

    let ctx = TemplateContext {
        feeds: Arc::new(HttpFeedClient::from_config(&cfg.http)?),
        feed_options: cfg.display.feed_options()?,
    };
    let (host, mut done_rx) = ChannelHost::new();
    let mut player = SlidePlayer::new(ctx, Arc::new(host));
    let gap = Duration::from_millis(cfg.app.gap_ms);

    info!(slides = cfg.playlist.len(), "starting playlist");
    'playback: loop {
        for entry in &cfg.playlist {
            let slide = entry.slide.activate(ExecutionId::generate());
            player.show(&slide, &entry.content, true);

            tokio::select! {
                finished = wait_done(&mut done_rx, &slide.execution_id) => {
                    if !finished {
                        warn!("host channel closed");
                        break 'playback;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break 'playback;
                }
            }

            if !gap.is_zero() {
                player.stop();
                tokio::time::sleep(gap).await;
            }
        }
        if args.once || !cfg.app.loop_playlist {
            break;
        }
    }

    player.stop();
    info!("playlist stopped");
    Ok(())
}
