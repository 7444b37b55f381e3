fn main() -> anyhow::Result<()> {
    skill_market_lib::run()
}
