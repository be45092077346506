use anyhow::Context;

use at_config::TrackerConfig;

/// Handle `atrack config`.
pub fn handle(config: &TrackerConfig) -> anyhow::Result<()> {
    let rendered = render(config)?;
    print!("{rendered}");
    Ok(())
}

fn render(config: &TrackerConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("failed to render configuration as TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rendered_config_loads_back() {
        let mut config = TrackerConfig::for_endpoint("https://collector.test");
        config.batching.max_batch_size = 7;

        let rendered = render(&config).unwrap();
        assert!(rendered.contains("[collector]"));

        let back: TrackerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(back.collector.endpoint, "https://collector.test");
        assert_eq!(back.batching.max_batch_size, 7);
        assert!(back.general.user_id.is_none());
    }
}
