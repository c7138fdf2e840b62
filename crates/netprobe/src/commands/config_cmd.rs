//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn keyring_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to access keyring: {e}"),
    }
}

fn store_in_keyring(key: &str, secret: &str) -> Result<(), CliError> {
    keyring::Entry::new(config::KEYRING_SERVICE, key)
        .map_err(keyring_err)?
        .set_password(secret)
        .map_err(keyring_err)
}

fn sorted_names<V>(map: &std::collections::HashMap<String, V>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// Replace every `password` value in a serialized config.
fn redact(value: &mut toml::Value) {
    match value {
        toml::Value::Table(table) => {
            for (key, v) in table.iter_mut() {
                if key == "password" {
                    *v = toml::Value::String(REDACTED.into());
                } else {
                    redact(v);
                }
            }
        }
        toml::Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn redacted_config(cfg: &Config) -> Result<toml::Value, CliError> {
    let mut value = toml::Value::try_from(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: format!("failed to serialize config: {e}"),
    })?;
    redact(&mut value);
    Ok(value)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let mut opts = global.clone();
            config::apply_defaults(&mut opts, &cfg)?;
            let value = redacted_config(&cfg)?;
            let out = match opts.output_format() {
                OutputFormat::Plain | OutputFormat::Table => toml::to_string_pretty(&value)
                    .map_err(|e| CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to render config: {e}"),
                    })?,
                ref format => output::render_structured(format, &value).unwrap_or_default(),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() && cfg.devices.is_empty() {
                eprintln!("No profiles configured. Run: netprobe config init");
                return Ok(());
            }
            for name in sorted_names(&cfg.profiles) {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            if !cfg.devices.is_empty() {
                println!("\ndevices:");
                for name in sorted_names(&cfg.devices) {
                    let dev = &cfg.devices[name];
                    println!("  {name} ({} @ {})", dev.device_type, dev.host);
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_file(&config::config_path())?;

            if !cfg.profiles.contains_key(&name) {
                let available = sorted_names(&cfg.profiles);
                return Err(CliError::ProfileNotFound {
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetPassword { device } => {
            let cfg = config::load_config()?;

            let (keyring_key, label) = match device {
                Some(name) => {
                    if !cfg.devices.contains_key(&name) {
                        let available = sorted_names(&cfg.devices);
                        return Err(CliError::DeviceNotFound {
                            available: if available.is_empty() {
                                "(none)".into()
                            } else {
                                available.join(", ")
                            },
                            name,
                        });
                    }
                    (config::device_keyring_key(&name), format!("device '{name}'"))
                }
                None => {
                    let profile_name = config::active_profile_name(global, &cfg);
                    if !cfg.profiles.contains_key(&profile_name) {
                        let available = sorted_names(&cfg.profiles);
                        return Err(CliError::ProfileNotFound {
                            available: if available.is_empty() {
                                "(none)".into()
                            } else {
                                available.join(", ")
                            },
                            name: profile_name,
                        });
                    }
                    (
                        config::profile_keyring_key(&profile_name),
                        format!("profile '{profile_name}'"),
                    )
                }
            };

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            store_in_keyring(&keyring_key, &secret)?;
            eprintln!("✓ Password stored in system keyring for {label}");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    // Existing profiles and devices are kept, so an unreadable file stops here
    let mut cfg = config::load_config_file(&config_path)?;
    eprintln!("netprobe configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let manager: String = Input::new()
        .with_prompt("Manager URL")
        .default("https://sandbox-sdwan-2.cisco.com".into())
        .interact_text()
        .map_err(prompt_err)?;
    netprobe_config::parse_manager_url(&manager)?;

    let username: String = Input::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

    if username.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let password_field = if store_selection == 0 {
        store_in_keyring(&config::profile_keyring_key(&profile_name), &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    let insecure_choices = &[
        "Accept self-signed certificates (lab managers)",
        "Verify certificates against the system store",
    ];
    let insecure_selection = Select::new()
        .with_prompt("TLS verification")
        .items(insecure_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let profile = Profile {
        manager,
        username: Some(username),
        password: password_field,
        insecure: Some(insecure_selection == 0),
        ..Profile::default()
    };

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: netprobe devices list");

    Ok(())
}
