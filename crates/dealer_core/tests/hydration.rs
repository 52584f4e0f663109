use dealer_core::db::open_db_in_memory;
use dealer_core::{
    AccountType, ClassifierResolver, Dao, Partner, Person, PersonClassification, Reference,
    SqliteDao,
};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};

const PARTNERS: usize = 20;

static STATEMENTS: AtomicUsize = AtomicUsize::new(0);

fn count_statement(_sql: &str) {
    STATEMENTS.fetch_add(1, Ordering::SeqCst);
}

fn seed_partners(conn: &Connection) {
    let resolver = ClassifierResolver::try_new(conn).unwrap();
    let customer = resolver
        .resolve_kind(PersonClassification::Customer)
        .unwrap();
    let savings = resolver.resolve_kind(AccountType::Savings).unwrap();

    let persons = SqliteDao::<Person>::try_new(conn).unwrap();
    let partners = SqliteDao::<Partner>::try_new(conn).unwrap();
    for index in 0..PARTNERS {
        let mut person = Person::new(format!("Pessoa {index}"), format!("{index:011}"));
        person.classification = Some(Reference::Stub(customer));
        persons.save(&mut person).unwrap();

        let mut partner = Partner::new(
            Reference::Stub(person.id.unwrap()),
            format!("Revenda {index}"),
        );
        partner.account_type = Some(Reference::Stub(savings));
        partners.save(&mut partner).unwrap();
    }
}

#[test]
fn listing_partners_loads_each_reference_with_one_query() {
    let mut conn = open_db_in_memory().unwrap();
    seed_partners(&conn);

    conn.trace(Some(count_statement));
    let statements = {
        let partners = SqliteDao::<Partner>::try_new(&conn).unwrap();
        STATEMENTS.store(0, Ordering::SeqCst);

        let listed = partners.list_all(None).unwrap();
        assert_eq!(listed.len(), PARTNERS);
        for partner in &listed {
            let person = partner.person.get().expect("person should be hydrated");
            assert!(person
                .classification
                .as_ref()
                .and_then(Reference::get)
                .is_some());
            assert!(partner
                .account_type
                .as_ref()
                .and_then(Reference::get)
                .is_some());
        }
        STATEMENTS.load(Ordering::SeqCst)
    };
    conn.trace(None);

    // One listing query, then person, person classification and account type.
    assert!(
        statements <= 1 + 3 * PARTNERS,
        "list_all of {PARTNERS} partners issued {statements} statements"
    );
}
