#[cfg(test)]
mod scanner_tests {
    use rlox::scanner::Scanner;
    use rlox::token::{Token, TokenType};

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn one_or_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= - ; /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::MINUS, "-"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "var foo = fun fund _bar while whilee",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::EQUAL, "="),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "fund"),
                (TokenType::IDENTIFIER, "_bar"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "whilee"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn number_literals_keep_their_value() {
        let tokens: Vec<Token> = Scanner::new("1 2.5 10.00")
            .filter_map(Result::ok)
            .collect();

        let values: Vec<f64> = tokens
            .iter()
            .filter_map(|t| match t.token_type {
                TokenType::NUMBER(n) => Some(n),
                _ => None,
            })
            .collect();

        assert_eq!(values, vec![1.0, 2.5, 10.0]);
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        assert_token_sequence(
            "1.",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn string_literal_excludes_delimiters() {
        let tokens: Vec<Token> = Scanner::new("\"hello world\"")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "\"hello world\"");

        match &tokens[0].token_type {
            TokenType::STRING(literal) => assert_eq!(literal, "hello world"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn multiline_string_advances_the_line_counter() {
        let tokens: Vec<Token> = Scanner::new("\"one\ntwo\nthree\"")
            .filter_map(Result::ok)
            .collect();

        // The string token is tagged with the line it closes on, as is EOF.
        assert_eq!(tokens[0].line, 3);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_token_sequence(
            "// nothing here\n\t 1 // trailing\n2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn unexpected_characters_are_reported_and_skipped() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character."),
                "unexpected diagnostic: {}",
                err
            );
        }

        let tokens: Vec<&Token> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(tokens[0].token_type, TokenType::COMMA);
        assert_eq!(tokens[1].token_type, TokenType::DOT);
        assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let results: Vec<_> = Scanner::new("\"open").collect();

        assert_eq!(results.len(), 2);
        assert!(results[0]
            .as_ref()
            .err()
            .expect("expected an error")
            .to_string()
            .contains("Unterminated string."));
        assert_eq!(
            results[1].as_ref().expect("expected EOF").token_type,
            TokenType::EOF
        );
    }

    #[test]
    fn eof_carries_the_final_line() {
        let tokens: Vec<Token> = Scanner::new("1;\n2;\n").filter_map(Result::ok).collect();

        let eof = tokens.last().expect("missing EOF");
        assert_eq!(eof.token_type, TokenType::EOF);
        assert_eq!(eof.line, 3);
    }
}
