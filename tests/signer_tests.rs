//! Signing built transactions and passing them between co-signers as files

mod common;

use common::{coins, foreign_address, TestWallet};
use sidechain_wallet_libs::{
    data_structures::{script::split_signatures, SignState, SignStatus},
    read_transaction_file,
    signing::Account,
    write_transaction_file, KeyProvider, WalletError,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn test_standard_transaction_signing() -> TestResult {
    let t = TestWallet::new().await?;
    let (owner, source) = t.account().await?;
    t.fund_native(1, &source, &["2"])?;

    let mut tx = t
        .wallet
        .create_transaction(&source, &foreign_address(), coins("1"), coins("0.1"))
        .await?;
    assert_eq!(tx.sign_status()?, SignStatus { have: 0, need: 1 });

    // A stranger cannot sign and leaves the transaction untouched
    let before = tx.clone();
    let err = t.wallet.sign(&mut tx, &Account::random()).unwrap_err();
    assert!(matches!(err, WalletError::NotASigner(_)));
    assert_eq!(tx, before);

    let status = t.wallet.sign(&mut tx, &owner)?;
    assert_eq!(status.state(), SignState::FullySigned);
    let signatures = split_signatures(&tx.programs[0].parameter)?;
    assert_eq!(signatures.len(), 1);
    assert!(owner
        .public_key()
        .verify(&tx.serialize_unsigned(), signatures[0]));
    Ok(())
}

#[tokio::test]
async fn test_multisig_co_signing_through_files() -> TestResult {
    let t = TestWallet::new().await?;
    let signers: Vec<Account> = (0..3).map(|_| Account::random()).collect();
    let keys: Vec<_> = signers.iter().map(|s| s.public_key()).collect();
    let multisig = t.wallet.add_multisig_account(2, &keys).await?;
    t.fund_native(1, &multisig.address, &["5"])?;

    let tx = t
        .wallet
        .create_transaction(&multisig.address, &foreign_address(), coins("1"), coins("0.1"))
        .await?;
    let dir = tempfile::tempdir()?;

    let path = write_transaction_file(dir.path(), &tx)?;
    assert!(path.ends_with("to_be_signed.txn"));

    let mut tx = read_transaction_file(&path)?;
    let status = t.wallet.sign(&mut tx, &signers[2])?;
    assert_eq!(status, SignStatus { have: 1, need: 2 });
    let path = write_transaction_file(dir.path(), &tx)?;
    assert!(path.ends_with("to_be_signed_1_of_2.txn"));

    let outsider = Account::random();
    let before = tx.clone();
    let err = t.wallet.sign(&mut tx, &outsider).unwrap_err();
    assert!(matches!(err, WalletError::NotASigner(_)));
    assert_eq!(tx, before);

    let mut tx = read_transaction_file(&path)?;
    let status = t.wallet.sign(&mut tx, &signers[0])?;
    assert_eq!(status, SignStatus { have: 2, need: 2 });
    let path = write_transaction_file(dir.path(), &tx)?;
    assert!(path.ends_with("ready_to_send.txn"));

    let before = tx.clone();
    let err = t.wallet.sign(&mut tx, &signers[1]).unwrap_err();
    assert!(matches!(
        err,
        WalletError::AlreadyFullySigned { have: 2, need: 2 }
    ));
    assert_eq!(tx, before);
    Ok(())
}

#[tokio::test]
async fn test_empty_transaction_file_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("to_be_signed.txn");
    std::fs::write(&path, "  \n")?;
    assert!(matches!(
        read_transaction_file(&path),
        Err(WalletError::InvalidArgument(_))
    ));

    std::fs::write(&path, "zz")?;
    assert!(matches!(
        read_transaction_file(&path),
        Err(WalletError::SerializationError(_))
    ));
    Ok(())
}
