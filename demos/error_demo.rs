// Demo: parse errors with source spans.
//
// Run with: cargo run --example error_demo

use mpst::parser::parse;

fn main() {
    println!("=== Protocol Parser Error Message Demo ===\n");

    println!("Example 1: Undeclared role\n");
    let undeclared_role = r#"
        global protocol Example(role Alice, role Bob) {
            Alice -> Charlie: Hello();
        }
    "#;
    match parse(undeclared_role) {
        Ok(_) => println!("Unexpected success!"),
        Err(e) => println!("{e}"),
    }

    println!("\n{}\n", "=".repeat(60));

    println!("Example 2: `continue` outside any `rec`\n");
    let unbound_continue = r#"
        global protocol Example(role A, role B) {
            continue Loop;
        }
    "#;
    match parse(unbound_continue) {
        Ok(_) => println!("Unexpected success!"),
        Err(e) => println!("{e}"),
    }

    println!("\n{}\n", "=".repeat(60));

    println!("Example 3: statement after `continue`\n");
    let unreachable = r#"
        global protocol Example(role A, role B) {
            rec Loop {
                continue Loop;
                A -> B: Unreachable();
            }
        }
    "#;
    match parse(unreachable) {
        Ok(_) => println!("Unexpected success!"),
        Err(e) => println!("{e}"),
    }

    println!("\n{}\n", "=".repeat(60));

    println!("Example 4: valid protocol (for comparison)\n");
    let valid = r#"
        global protocol PingPong(role Alice, role Bob) {
            Alice -> Bob: Ping();
            Bob -> Alice: Pong();
        }
    "#;
    match parse(valid) {
        Ok(protocols) => {
            let protocol = &protocols[0];
            println!("parsed protocol: {}", protocol.name);
            println!(
                "roles: {}",
                protocol.roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
            );
        }
        Err(e) => println!("Error: {e}"),
    }
}
