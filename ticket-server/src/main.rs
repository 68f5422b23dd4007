use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ticket_common::db::{self, create_db_thread_pool};
use ticket_common::email::dispatcher::EmailDispatcher;
use ticket_common::email::senders::{MockSender, SmtpSender};
use ticket_common::email::EmailSender;

mod env;
mod handlers;
mod middleware;
mod services;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let mut port = 9000u16;

    let mut args = std::env::args();

    // Eat the first argument, which is the relative path to the executable
    args.next();

    while let Some(arg) = args.next() {
        match arg.to_lowercase().as_str() {
            "--port" => {
                let port_str = {
                    let next_arg = args.next();

                    match next_arg {
                        Some(s) => s,
                        None => {
                            eprintln!("ERROR: --port option specified but no port was given");
                            std::process::exit(1);
                        }
                    }
                };

                port = {
                    let port_result = port_str.parse::<u16>();

                    match port_result {
                        Ok(p) => p,
                        Err(_) => {
                            eprintln!("ERROR: Incorrect format for port. Integer expected");
                            std::process::exit(1);
                        }
                    }
                };

                continue;
            }
            a => {
                eprintln!("ERROR: Invalid argument: {}", &a);
                std::process::exit(1);
            }
        }
    }

    let base_addr = format!("127.0.0.1:{}", &port);

    let _logger = Logger::try_with_str(&env::CONF.log_level)
        .expect("Invalid log level in configuration")
        .log_to_file(FileSpec::default().directory("./logs"))
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndCompressedFiles(60, 365),
        )
        .cleanup_in_background_thread(true)
        .duplicate_to_stdout(Duplicate::All)
        .write_mode(WriteMode::Async)
        .format(|writer, now, record| {
            write!(
                writer,
                "{:5} | {} | {}:{} | {}",
                record.level(),
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
                record.module_path().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .use_utc()
        .start()
        .expect("Failed to start logger");

    let database_uri = format!(
        "postgres://{}:{}@{}:{}/{}",
        env::CONF.db_username,
        env::CONF.db_password,
        env::CONF.db_hostname,
        env::CONF.db_port,
        env::CONF.db_name,
    );

    // To prevent resource starvation, max connections must be at least as large
    // as the number of actix workers
    let db_max_connections = std::cmp::max(
        env::CONF.db_max_connections,
        env::CONF.actix_worker_count as u32,
    );

    log::info!("Connecting to database...");

    let db_thread_pool =
        create_db_thread_pool(&database_uri, db_max_connections, env::CONF.db_idle_timeout);

    log::info!("Successfully connected to database");

    let email_sender: EmailSender = if env::CONF.email_enabled {
        log::info!("Connecting to SMTP relay...");

        let sender = SmtpSender::with_credentials(
            &env::CONF.smtp_username,
            &env::CONF.smtp_password,
            &env::CONF.smtp_address,
            env::CONF.max_smtp_connections,
            env::CONF.smtp_idle_timeout,
        )
        .expect("Failed to connect to SMTP relay");

        match sender.test_connection().await {
            Ok(true) => (),
            Ok(false) => panic!("Failed to connect to SMTP relay"),
            Err(e) => panic!("Failed to connect to SMTP relay: {e}"),
        }

        log::info!("Successfully connected to SMTP relay");

        Box::new(sender)
    } else {
        log::info!("Emails are disabled. Using mock sender.");
        Box::new(MockSender::new())
    };

    let email_dispatcher = EmailDispatcher::start(
        Arc::new(email_sender),
        env::CONF.email_from_address.clone(),
        env::CONF.email_reply_to_address.clone(),
        env::CONF.email_queue_depth,
    );

    std::fs::create_dir_all(&env::CONF.uploads_dir)
        .expect("Failed to create the uploads directory");

    const OTP_SWEEP_PERIOD: Duration = Duration::from_secs(3600);

    let sweep_pool = db_thread_pool.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(OTP_SWEEP_PERIOD);
        interval.tick().await;

        loop {
            interval.tick().await;

            let auth_dao = db::auth::Dao::new(&sweep_pool);
            match web::block(move || auth_dao.delete_all_expired_otps(SystemTime::now())).await {
                Ok(Ok(count)) if count > 0 => log::info!("Cleared {count} expired OTPs"),
                Ok(Ok(_)) => (),
                Ok(Err(e)) => log::error!("Failed to clear expired OTPs: {e}"),
                Err(e) => log::error!("Failed to clear expired OTPs: {e}"),
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(db_thread_pool.clone()))
            .app_data(Data::new(email_dispatcher.clone()))
            .configure(services::api::configure)
            .configure(services::web::configure)
            .wrap(actix_web::middleware::Logger::default())
    })
    .workers(env::CONF.actix_worker_count)
    .bind(base_addr)?
    .run()
    .await?;

    // All server threads have been joined; nothing reads the config anymore
    unsafe { env::CONF.zeroize() };

    Ok(())
}
