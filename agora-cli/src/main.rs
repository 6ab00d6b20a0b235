use anyhow::Context;
use std::io::{BufRead, Write};

use agora_engine::{reply, CommentId, Engine, PostId};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Seed the engine with the Zipf simulation before showing the menu
    #[structopt(long)]
    seed: bool,
}

fn read_field<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> anyhow::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading input")?;
    Ok(line.trim().to_string())
}

fn report<W: Write>(
    output: &mut W,
    res: Result<String, agora_engine::Error>,
) -> anyhow::Result<()> {
    match res {
        Ok(message) => writeln!(output, "{message}")?,
        Err(err) => writeln!(output, "{err}")?,
    }
    Ok(())
}

fn run_menu<R: BufRead, W: Write>(
    engine: &Engine,
    mut input: R,
    mut output: W,
) -> anyhow::Result<()> {
    loop {
        write!(
            output,
            "\n--- REDDIT CLONE ---\n\
             1. Register User\n\
             2. Create Subreddit\n\
             3. Create Post\n\
             4. Add Comment\n\
             5. Reply to Comment\n\
             6. View Subreddit Feed\n\
             7. Upvote/Downvote Post\n\
             8. Send Direct Message\n\
             9. List Direct Messages\n\
             10. Simulate Connection/Disconnection\n\
             11. Simulate Zipf Distribution\n\
             12. Exit\n\
             Enter your choice: "
        )?;
        output.flush()?;
        let mut choice = String::new();
        if input.read_line(&mut choice).context("reading menu choice")? == 0 {
            // stdin closed, nothing more to do
            return Ok(());
        }

        match choice.trim() {
            "1" => {
                let username = read_field(&mut input, &mut output, "Enter username: ")?;
                let password = read_field(&mut input, &mut output, "Enter password: ")?;
                report(
                    &mut output,
                    engine
                        .register_user(&username, &password)
                        .map(|()| reply::USER_REGISTERED.to_string()),
                )?;
            }
            "2" => {
                let name = read_field(&mut input, &mut output, "Enter subreddit name: ")?;
                let creator = read_field(&mut input, &mut output, "Enter creator username: ")?;
                report(
                    &mut output,
                    engine
                        .create_subreddit(&name, &creator)
                        .map(|()| reply::SUBREDDIT_CREATED.to_string()),
                )?;
            }
            "3" => {
                let subreddit = read_field(&mut input, &mut output, "Enter subreddit name: ")?;
                let author = read_field(&mut input, &mut output, "Enter author username: ")?;
                let content = read_field(&mut input, &mut output, "Enter post content: ")?;
                report(
                    &mut output,
                    engine
                        .create_post(&subreddit, &author, &content)
                        .map(reply::post_created),
                )?;
            }
            "4" => {
                let post_id = read_field(&mut input, &mut output, "Enter post ID: ")?;
                let post_id = match post_id.parse::<u64>() {
                    Ok(id) => PostId(id),
                    Err(_) => {
                        writeln!(output, "Invalid post ID, please enter a number.")?;
                        continue;
                    }
                };
                let author = read_field(&mut input, &mut output, "Enter author username: ")?;
                let content = read_field(&mut input, &mut output, "Enter comment content: ")?;
                report(
                    &mut output,
                    engine
                        .add_comment(post_id, &author, &content)
                        .map(reply::comment_added),
                )?;
            }
            "5" => {
                let comment_id = read_field(&mut input, &mut output, "Enter comment ID: ")?;
                let comment_id = match comment_id.parse::<u64>() {
                    Ok(id) => CommentId(id),
                    Err(_) => {
                        writeln!(output, "Invalid comment ID, please enter a number.")?;
                        continue;
                    }
                };
                let author = read_field(&mut input, &mut output, "Enter author username: ")?;
                let content = read_field(&mut input, &mut output, "Enter reply content: ")?;
                report(
                    &mut output,
                    engine
                        .reply_to_comment(comment_id, &author, &content)
                        .map(reply::reply_added),
                )?;
            }
            "6" => {
                let subreddit = read_field(&mut input, &mut output, "Enter subreddit name: ")?;
                report(&mut output, engine.render_feed(&subreddit))?;
            }
            "7" => {
                let post_id = read_field(&mut input, &mut output, "Enter post ID: ")?;
                let post_id = match post_id.parse::<u64>() {
                    Ok(id) => PostId(id),
                    Err(_) => {
                        writeln!(output, "Invalid post ID, please enter a number.")?;
                        continue;
                    }
                };
                let username = read_field(&mut input, &mut output, "Enter username: ")?;
                let vote = read_field(
                    &mut input,
                    &mut output,
                    "Enter vote (1 for upvote, -1 for downvote): ",
                )?;
                let vote = match vote.parse::<i64>() {
                    Ok(vote) => vote,
                    Err(_) => {
                        writeln!(output, "Invalid vote, please enter a number.")?;
                        continue;
                    }
                };
                report(
                    &mut output,
                    engine
                        .vote_post(&username, post_id, vote)
                        .map(|()| reply::VOTE_REGISTERED.to_string()),
                )?;
            }
            "8" => {
                let sender = read_field(&mut input, &mut output, "Enter sender username: ")?;
                let recipient = read_field(&mut input, &mut output, "Enter recipient username: ")?;
                let content = read_field(&mut input, &mut output, "Enter message content: ")?;
                report(
                    &mut output,
                    engine
                        .send_message(&sender, &recipient, &content)
                        .map(|()| reply::MESSAGE_SENT.to_string()),
                )?;
            }
            "9" => {
                let username = read_field(&mut input, &mut output, "Enter username: ")?;
                report(&mut output, engine.list_messages(&username))?;
            }
            "10" => {
                let username = read_field(&mut input, &mut output, "Enter username: ")?;
                let status = read_field(
                    &mut input,
                    &mut output,
                    "Enter connection status (true for connect, false for disconnect): ",
                )?;
                let connected = match status.parse::<bool>() {
                    Ok(connected) => connected,
                    Err(_) => {
                        writeln!(output, "Invalid connection status, please enter true or false.")?;
                        continue;
                    }
                };
                report(
                    &mut output,
                    engine
                        .set_connection_status(&username, connected)
                        .map(|connected| reply::connection_changed(&username, connected)),
                )?;
            }
            "11" => {
                engine.simulate_zipf();
                writeln!(output, "{}", reply::ZIPF_SIMULATED)?;
            }
            "12" => {
                writeln!(output, "Exiting...")?;
                return Ok(());
            }
            _ => {
                writeln!(output, "Invalid choice, please try again.")?;
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    let engine = Engine::new();
    if opt.seed {
        engine.simulate_zipf();
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_menu(&engine, stdin.lock(), stdout.lock())
}
