use unix_fs_kit::{FsBackend, UnixFS};

fn main() -> unix_fs_kit::Result<()> {
    // RUST_LOG=debug shows every created and removed entry
    env_logger::init();

    // creates the root `/`, which is also the current working directory
    let mut fs = UnixFS::new();

    // creates `/docs` and `/hello.txt`; listings are always sorted by name
    fs.mkdir("docs")?;
    fs.touch("hello.txt")?;

    // change the current working directory to `/docs`
    fs.cd("docs")?;
    fs.touch("first.txt")?;
    fs.mkdir("drafts")?;
    fs.pwd_to(&mut std::io::stdout())?;

    // `touch` is idempotent, `mkdir` is not
    fs.touch("first.txt")?;
    assert!(fs.mkdir("drafts").is_err());

    // prints `drafts/` and `first.txt`
    fs.ls_to(".", &mut std::io::stdout())?;

    // a file can't become the current working directory
    assert!(fs.cd("first.txt").is_err());

    // back to the root; `..` at the root stays at the root
    fs.cd("..")?;
    fs.cd("..")?;
    println!("{}", fs.pwd());

    for path in fs.tree() {
        println!("  {path}");
    }

    // removes `/docs` together with everything inside
    fs.rm("docs")?;
    fs.ls_to("/", &mut std::io::stdout())?;

    println!("released {} entries", fs.teardown()?);
    Ok(())
}
