use rexpect::error::Error;
use rexpect::spawn;

fn slang_repl() -> Result<rexpect::session::PtySession, Error> {
    spawn("cargo run --quiet", Some(30_000))
}

#[test]
fn ctrl_d_exits_repl() -> Result<(), Error> {
    let mut p = slang_repl()?;

    p.exp_string("slang> ")?;

    // Send Ctrl+D (EOF)
    p.send_control('d')?;

    p.exp_eof()?;

    Ok(())
}

#[test]
fn ctrl_c_exits_repl() -> Result<(), Error> {
    let mut p = slang_repl()?;

    p.exp_string("slang> ")?;

    p.send_control('c')?;

    p.exp_eof()?;

    Ok(())
}

#[test]
fn echoes_every_stage_before_printing() -> Result<(), Error> {
    let mut p = slang_repl()?;

    p.exp_string("slang> ")?;
    p.send_line("print 1 + 2;")?;

    p.exp_string("Tokens: [")?;
    p.exp_string("AST: [")?;
    p.exp_string("Locals: {}")?;
    p.exp_string("3")?;

    // Back at the prompt for the next line
    p.exp_string("slang> ")?;

    p.send_control('d')?;
    p.exp_eof()?;

    Ok(())
}

#[test]
fn continues_after_an_error() -> Result<(), Error> {
    let mut p = slang_repl()?;

    p.exp_string("slang> ")?;
    p.send_line("print missing;")?;

    p.exp_string("Undefined variable 'missing'.")?;
    p.exp_string("slang> ")?;

    p.send_line("print 42;")?;
    p.exp_string("42")?;

    p.send_control('d')?;
    p.exp_eof()?;

    Ok(())
}

#[test]
fn persists_state_between_lines() -> Result<(), Error> {
    let mut p = slang_repl()?;

    p.exp_string("slang> ")?;
    p.send_line("var x = 21;")?;

    p.exp_string("slang> ")?;
    p.send_line("print x * 2;")?;

    p.exp_string("42")?;

    p.send_control('d')?;
    p.exp_eof()?;

    Ok(())
}
