//! Sign-in command handlers.

use crate::context::AppContext;

pub(crate) async fn run_login(
    ctx: &mut AppContext,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let session = ctx
        .session
        .login(email, password)
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "login"))?;

    match &session.user {
        Some(user) => println!("logged in as {} <{}>", user.full_name, user.email),
        None => println!("logged in"),
    }
    Ok(())
}

pub(crate) fn run_logout(ctx: &mut AppContext) -> anyhow::Result<()> {
    if !ctx.session.session().is_authenticated() {
        println!("not logged in");
        return Ok(());
    }
    ctx.session
        .logout()
        .map_err(|e| ctx.feedback.api_failure(e, "logout"))?;
    println!("logged out");
    Ok(())
}

/// Prints the saved profile. With `refresh`, fetches it from the backend
/// first.
pub(crate) async fn run_whoami(ctx: &AppContext, refresh: bool) -> anyhow::Result<()> {
    let Some(saved) = &ctx.session.session().user else {
        println!("not logged in");
        return Ok(());
    };

    let user = if refresh {
        ctx.services()
            .auth
            .get_current_user()
            .await
            .map_err(|e| ctx.feedback.api_failure(e, "whoami"))?
    } else {
        saved.clone()
    };

    println!("{} <{}>", user.full_name, user.email);
    println!("  id:     {}", user.id);
    if let Some(phone) = &user.phone {
        println!("  phone:  {phone}");
    }
    if let Some(active) = user.is_active {
        println!("  active: {active}");
    }
    println!("  since:  {}", user.created_at.format("%Y-%m-%d"));
    Ok(())
}

pub(crate) async fn run_chat(ctx: &AppContext, message: &str) -> anyhow::Result<()> {
    let reply = ctx
        .services()
        .chatbot
        .chat(message)
        .await
        .map_err(|e| ctx.feedback.api_failure(e, "chat"))?;
    println!("{}", reply.response);
    if reply.context_used {
        tracing::debug!("reply used delivery context");
    }
    Ok(())
}
