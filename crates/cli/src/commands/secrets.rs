//! Password hashing and session token generation.

use std::io::BufRead;

/// Shortest accepted session token, in random bytes.
const MIN_SECRET_BYTES: usize = 16;

/// Read a password from stdin and print its Argon2id PHC hash.
///
/// # Errors
///
/// Returns an error if stdin cannot be read, the password is empty, or
/// hashing fails.
pub fn hash_password() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Enter the password, then press Enter");

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err("Password must not be empty".into());
    }

    let hash = mrtc_site::services::auth::hash_password(password)
        .map_err(|e| format!("Failed to hash password: {e}"))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}

/// Generate `bytes` random bytes, hex encoded.
fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0_u8; bytes];
    rand::fill(buf.as_mut_slice());
    hex::encode(buf)
}

/// Print a random session token.
///
/// # Errors
///
/// Returns an error if fewer than 16 bytes are requested.
pub fn gen_secret(bytes: usize) -> Result<(), Box<dyn std::error::Error>> {
    if bytes < MIN_SECRET_BYTES {
        return Err(format!("Use at least {MIN_SECRET_BYTES} bytes").into());
    }

    #[allow(clippy::print_stdout)]
    {
        println!("{}", generate_secret(bytes));
    }
    Ok(())
}
