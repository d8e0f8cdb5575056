use std::{
    error::Error,
    fs::{File, OpenOptions},
    io::{Read, Write},
    path::Path,
};

fn key_file(workdir: &Path, name: &str, key: Option<&str>) -> Option<std::path::PathBuf> {
    key.map(|key| workdir.join(format!("{}.{}", name, key)))
        .filter(|path| path.exists())
        .or_else(|| Some(workdir.join(name)))
        .filter(|path| path.exists())
}

fn record_invocation(workdir: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(workdir.join("invocations"))?;
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    writeln!(file, "{}", args.join(" "))
}

fn record_stdin(workdir: &Path) -> std::io::Result<()> {
    let mut stdin = Vec::new();
    std::io::stdin().read_to_end(&mut stdin)?;
    if !stdin.is_empty() {
        std::fs::write(workdir.join("stdin"), stdin)?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn write_output_files(workdir: &Path, key: Option<&str>) -> std::io::Result<()> {
    match key.map(|key| workdir.join(format!("output.{}", key))) {
        Some(output) if output.is_dir() => copy_dir(&output, &std::env::current_dir()?),
        _ => Ok(()),
    }
}

fn get_exit_status(workdir: &Path, key: Option<&str>) -> Result<i32, Box<dyn Error>> {
    let path = key_file(workdir, "exit-status", key).ok_or("no exit status")?;
    let exit_status = std::fs::read_to_string(path)?.trim().parse()?;
    Ok(exit_status)
}

fn copy_stdout(workdir: &Path, key: Option<&str>) -> std::io::Result<()> {
    if let Some(path) = key_file(workdir, "stdout", key) {
        let mut file = File::open(path)?;
        std::io::copy(&mut file, &mut std::io::stdout())?;
    }
    Ok(())
}

fn copy_stderr(workdir: &Path, key: Option<&str>) -> std::io::Result<()> {
    if let Some(path) = key_file(workdir, "stderr", key) {
        let mut file = File::open(path)?;
        std::io::copy(&mut file, &mut std::io::stderr())?;
    }
    Ok(())
}

/// Stands in for an external program: records how it was called and replays canned output.
///
/// Canned files live next to the executable. `stdout.<key>`, `stderr.<key>`, `exit-status.<key>`
/// and the directory `output.<key>` apply when the first argument is `<key>`; the unsuffixed files
/// apply otherwise.
pub fn test_binary_main() {
    let workdir = std::env::current_exe()
        .unwrap()
        .parent()
        .unwrap()
        .to_owned();
    let key = std::env::args().nth(1);
    let key = key.as_deref();
    let _ = record_invocation(&workdir);
    let _ = record_stdin(&workdir);
    let _ = write_output_files(&workdir, key);
    let _ = copy_stdout(&workdir, key);
    let _ = copy_stderr(&workdir, key);

    let exit_status = get_exit_status(&workdir, key).unwrap_or(0);
    std::process::exit(exit_status);
}
