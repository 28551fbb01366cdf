fn main() -> anyhow::Result<()> {
    layer_stage_cli::run()
}
