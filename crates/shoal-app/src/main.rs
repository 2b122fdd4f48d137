use anyhow::{Context, Result, bail};
use shoal_app::Session;
use shoal_core::{Arena, ShoalConfig};
use tracing::{debug, info};

const STATUS_INTERVAL: u64 = 60;

fn main() -> Result<()> {
    init_tracing();
    let config = load_config()?;
    let arena = arena_from_env()?;
    let frames: u64 = match std::env::var("SHOAL_FRAMES") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("SHOAL_FRAMES must be a frame count, got '{raw}'"))?,
        Err(_) => 600,
    };

    let mut session = Session::new(config, arena)?;
    info!(frames, "running headless shoal session");
    for frame in 1..=frames {
        if let Some(events) = session.frame()
            && (events.births > 0 || events.deaths > 0)
        {
            debug!(
                tick = events.tick.0,
                births = events.births,
                deaths = events.deaths,
                "population changed",
            );
        }
        if frame % STATUS_INTERVAL == 0 {
            let status = session.status();
            info!(
                tick = status.tick,
                agents = status.agent_count,
                food = status.food_count,
                "status",
            );
        }
    }

    if let Some(summary) = session.world().history().last() {
        info!(
            tick = summary.tick.0,
            agents = summary.agent_count,
            average_energy = summary.average_energy,
            "session finished",
        );
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config() -> Result<ShoalConfig> {
    let Ok(path) = std::env::var("SHOAL_CONFIG") else {
        return Ok(ShoalConfig::default());
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration from {path}"))?;
    let config = ShoalConfig::from_json_str(&raw)
        .with_context(|| format!("invalid configuration in {path}"))?;
    info!(%path, "loaded configuration");
    Ok(config)
}

fn arena_from_env() -> Result<Arena> {
    let Ok(raw) = std::env::var("SHOAL_ARENA") else {
        return Ok(Arena::default());
    };
    parse_arena(&raw)
}

/// Parses `WIDTHxHEIGHT`, e.g. `1280x720`.
fn parse_arena(raw: &str) -> Result<Arena> {
    let Some((width, height)) = raw.trim().split_once(['x', 'X']) else {
        bail!("SHOAL_ARENA must look like WIDTHxHEIGHT, got '{raw}'");
    };
    let width: f32 = width.trim().parse().context("arena width")?;
    let height: f32 = height.trim().parse().context("arena height")?;
    Ok(Arena::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_strings_parse() {
        assert_eq!(parse_arena("640x480").expect("arena"), Arena::new(640.0, 480.0));
        assert_eq!(parse_arena(" 800 X 600 ").expect("arena"), Arena::new(800.0, 600.0));
        assert!(parse_arena("640").is_err());
        assert!(parse_arena("wide x tall").is_err());
    }
}
