use codepoint_dump::{CodepointDumper, Config};

fn main() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::format().compact();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .event_format(format)
        .init();

    CodepointDumper::new(Config::default()).run()?;

    Ok(())
}
