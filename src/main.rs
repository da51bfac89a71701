fn main() -> anyhow::Result<()> {
    photo_reminder::cli::run()
}
