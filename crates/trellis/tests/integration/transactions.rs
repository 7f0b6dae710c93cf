//! Transaction lifecycle: explicit control, lazy opening, and session
//! cleanup.

use trellis::Error;
use trellis_driver::backends::MockDriver;

use crate::common;

#[test]
fn open_twice_is_rejected() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    session.tx().open().expect("open");
    let error = session.tx().open().expect_err("double open");
    assert!(matches!(error, Error::TransactionAlreadyOpen));
    assert!(error.is_transaction_state());
    session.close().expect("close");
}

#[test]
fn commit_and_rollback_require_an_open_transaction() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    assert!(matches!(session.tx().commit(), Err(Error::NoTransaction)));
    assert!(matches!(session.tx().rollback(), Err(Error::NoTransaction)));
    session.close().expect("close");
}

#[test]
fn io_points_open_a_transaction_lazily() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    assert!(!session.is_transaction_open());
    session.add_vertex(&["Person"]).expect("add vertex");
    assert!(session.is_transaction_open());

    session.tx().commit().expect("commit");
    assert!(!session.is_transaction_open());

    // a read after commit opens the next transaction
    session.vertices(&[]).expect("vertices");
    assert!(session.is_transaction_open());
    session.close().expect("close");
}

#[test]
fn explicit_read_write_opens_once() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    session.tx().read_write().expect("read_write");
    assert!(session.tx().is_open());
    session.tx().read_write().expect("read_write again");
    assert!(session.tx().is_open());
    session.close().expect("close");
}

#[test]
fn closing_a_session_rolls_back_the_open_transaction() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    session.add_vertex(&["Person"]).expect("add vertex");
    session.close().expect("close");

    assert_eq!(driver.commits(), 0);
    assert_eq!(driver.rollbacks(), 1);
}

#[test]
fn dropping_a_session_closes_the_transaction() {
    let driver = MockDriver::new();
    {
        let mut session = common::session(&driver);
        session.add_vertex(&["Person"]).expect("add vertex");
        // dropped without close(): the leak path still releases resources
    }
    assert_eq!(driver.commits(), 0);
    assert_eq!(driver.rollbacks(), 1);
}

#[test]
fn transaction_close_discards_without_confirming() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    session.add_vertex(&["Person"]).expect("add vertex");
    session.tx().close();
    assert!(!session.is_transaction_open());
    assert_eq!(driver.rollbacks(), 1);
    session.close().expect("close");
}

#[test]
fn begin_after_commit_starts_a_fresh_transaction() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    session.tx().open().expect("open");
    session.tx().commit().expect("commit");
    session.tx().open().expect("reopen");
    session.tx().rollback().expect("rollback");

    assert_eq!(driver.commits(), 1);
    assert_eq!(driver.rollbacks(), 1);
    session.close().expect("close");
}
