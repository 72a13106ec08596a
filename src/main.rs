use anyhow::Result;

fn main() -> Result<()> {
    voxcraft::app::run()
}
