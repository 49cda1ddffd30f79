use clap::Args;
use std::sync::Arc;
use waitlist::error::AppError;
use waitlist::waitlist::{
    InMemoryWaitlistStore, ListQuery, Session, WaitlistConfig, WaitlistService, WaitlistStatus,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of synthetic signups to enqueue (at least 3)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(3..=50))]
    pub(crate) signups: u32,
    /// Reject waitlist signups beyond this many entries (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub(crate) max_entries: u64,
    /// Keep stored positions stored as-is instead of closing gaps after decisions
    #[arg(long)]
    pub(crate) no_renumber: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            signups: 5,
            max_entries: 0,
            no_renumber: false,
        }
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        signups,
        max_entries,
        no_renumber,
    } = args;

    let config = WaitlistConfig {
        max_entries,
        renumber_positions: !no_renumber,
        show_position: true,
        ..WaitlistConfig::default()
    };
    let service = WaitlistService::new(Arc::new(InMemoryWaitlistStore::new()), config)?;
    let admin = Session::new("demo-admin");

    println!("Waitlist lifecycle demo");
    println!(
        "- capacity {} | renumbering {}",
        if max_entries == 0 {
            "unlimited".to_string()
        } else {
            max_entries.to_string()
        },
        if no_renumber { "off" } else { "on" }
    );

    println!("\nSignups");
    let mut emails = Vec::with_capacity(signups as usize);
    for index in 1..=signups {
        let email = format!("guest{index}@example.com");
        match service.join(&email, None).await {
            Ok(entry) => {
                println!("  - {} joined at position {}", entry.email, entry.position);
                emails.push(entry.email);
            }
            Err(err) => println!("  - {} turned away: {}", email, err),
        }
    }

    if emails.len() < 3 {
        println!("\nNot enough entries admitted to continue the walkthrough");
        return Ok(());
    }

    println!("\nDecisions");
    let approved = service.approve(Some(&admin), &emails[0], None).await?;
    println!("  - approved {} (invite pending)", approved.email);
    let invited = service.approve(Some(&admin), &emails[1], Some(true)).await?;
    println!("  - approved {} and sent invite", invited.email);
    let rejected = service.reject(Some(&admin), &emails[2]).await?;
    println!("  - rejected {}", rejected.email);

    println!("\nQueue after decisions");
    for email in &emails[3..] {
        let view = service.position(email).await?;
        match view.position {
            Some(position) => println!("  - {} is #{}", view.email, position),
            None => println!("  - {} is {}", view.email, view.status),
        }
    }

    let outcome = service.promote_all(Some(&admin), None).await?;
    println!("\nPromote all approved: {} invite(s) sent", outcome.promoted);
    for entry in &outcome.entries {
        println!("  - {}", entry.email);
    }

    let completed = service.complete(Some(&admin), &emails[0]).await?;
    println!(
        "\nCompleted {} (was {})",
        completed.entry.email, completed.entry.status
    );

    let stats = service.stats(Some(&admin)).await?;
    println!(
        "\nStats: {} total | {} pending | {} approved | {} rejected",
        stats.total, stats.pending, stats.approved, stats.rejected
    );

    let pending = service
        .list(
            Some(&admin),
            &ListQuery {
                status: Some(WaitlistStatus::Pending),
                limit: None,
                offset: None,
            },
        )
        .await?;
    println!("Pending entries listed: {}", pending.total);

    if let Some(email) = emails.last() {
        let status = service.status(email).await?;
        match serde_json::to_string_pretty(&status) {
            Ok(json) => println!("\nPublic status payload:\n{}", json),
            Err(err) => println!("\nPublic status payload unavailable: {}", err),
        }
    }

    Ok(())
}
