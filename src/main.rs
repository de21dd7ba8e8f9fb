fn main() -> anyhow::Result<()> {
    log_conditions::run()
}
